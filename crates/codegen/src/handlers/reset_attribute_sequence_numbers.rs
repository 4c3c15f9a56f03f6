use super::{base_attrs, ClassHandler};
use crate::container::ClassContainer;
use crate::models::{ClassId, GroupId};
use crate::Result;
use std::collections::HashMap;

/// Renumber the sequence markers of a class to 1..N in order of appearance.
///
/// Numbering continues after the highest marker of the base classes so inherited and own
/// sequences never share a number.
#[derive(Debug)]
pub struct ResetAttributeSequenceNumbers;

impl ClassHandler for ResetAttributeSequenceNumbers {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let mut next = base_attrs(container, target)?
            .iter()
            .filter_map(|attr| attr.restrictions.sequence)
            .max()
            .unwrap_or(0)
            + 1;

        let mut numbers: HashMap<GroupId, GroupId> = HashMap::new();
        for attr in &mut container.class_mut(target).attrs {
            let Some(sequence) = attr.restrictions.sequence else {
                continue;
            };
            let number = *numbers.entry(sequence).or_insert_with(|| {
                let number = next;
                next += 1;
                number
            });
            attr.restrictions.sequence = Some(number);
        }
        Ok(())
    }
}
