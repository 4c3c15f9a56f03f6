use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{Attr, ClassId, CompositorKind};
use crate::Result;
use std::collections::HashMap;

/// Keep sequence markers only on sequences that actually repeat with several members.
///
/// Surviving members are flagged `sequential`, the rest lose their marker.
#[derive(Debug)]
pub struct ResetAttributeSequences;

impl ClassHandler for ResetAttributeSequences {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let class = container.class_mut(target);

        let mut members: HashMap<_, usize> = HashMap::new();
        for sequence in class.attrs.iter().filter_map(|attr| attr.restrictions.sequence) {
            *members.entry(sequence).or_default() += 1;
        }

        for attr in &mut class.attrs {
            let Some(sequence) = attr.restrictions.sequence else {
                continue;
            };
            if is_repeatable_sequence(attr) && members[&sequence] > 1 {
                attr.restrictions.sequential = Some(true);
            } else {
                attr.restrictions.sequence = None;
            }
        }
        Ok(())
    }
}

fn is_repeatable_sequence(attr: &Attr) -> bool {
    attr.restrictions
        .path
        .iter()
        .find(|entry| entry.kind == CompositorKind::Sequence)
        .is_some_and(|entry| entry.max_occurs > 1)
}
