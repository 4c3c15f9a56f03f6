use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{add_occurs, mul_occurs, Attr, ClassId, CompositorKind, PathEntry};
use crate::Result;

/// Fold the compositor path of every element into its effective occurrence bounds and the
/// innermost sequence, choice and group markers.
#[derive(Debug)]
pub struct CalculateAttributePaths;

impl ClassHandler for CalculateAttributePaths {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        for attr in &mut container.class_mut(target).attrs {
            if !attr.is_attribute() && !attr.is_enumeration() {
                process_attr_path(attr);
            }
        }
        Ok(())
    }
}

fn process_attr_path(attr: &mut Attr) {
    let restrictions = &mut attr.restrictions;
    if restrictions.path.is_empty() {
        return;
    }

    let mut min_occurs = restrictions.min_occurs.unwrap_or(1);
    let mut max_occurs = restrictions.max_occurs.unwrap_or(1);

    for entry in collapse(&restrictions.path) {
        let marker = match entry.kind {
            CompositorKind::Sequence => &mut restrictions.sequence,
            CompositorKind::Choice => &mut restrictions.choice,
            CompositorKind::Group => &mut restrictions.group,
            CompositorKind::All => {
                min_occurs = mul_occurs(min_occurs, entry.min_occurs);
                max_occurs = mul_occurs(max_occurs, entry.max_occurs);
                continue;
            }
        };
        if marker.is_none() {
            *marker = Some(entry.id);
        }

        min_occurs = mul_occurs(min_occurs, entry.min_occurs);
        max_occurs = mul_occurs(max_occurs, entry.max_occurs);
    }

    restrictions.min_occurs = Some(min_occurs);
    restrictions.max_occurs = Some(max_occurs);
}

/// Merge adjacent entries of the same compositor by summing their bounds.
fn collapse(path: &[PathEntry]) -> Vec<PathEntry> {
    let mut result: Vec<PathEntry> = Vec::with_capacity(path.len());
    for entry in path {
        match result.last_mut() {
            Some(last) if last.kind == entry.kind && last.id == entry.id => {
                last.min_occurs = add_occurs(last.min_occurs, entry.min_occurs);
                last.max_occurs = add_occurs(last.max_occurs, entry.max_occurs);
            }
            _ => result.push(*entry),
        }
    }
    result
}
