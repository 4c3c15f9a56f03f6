use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{add_occurs, Attr, ClassId};
use crate::Result;

/// Collapse identical attrs.
///
/// Repeated elements become one element whose bounds cover every occurrence; identical
/// attributes and enumeration members are simply dropped.
#[derive(Debug)]
pub struct MergeAttributes;

impl ClassHandler for MergeAttributes {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let class = container.class_mut(target);
        let mut result: Vec<Attr> = Vec::with_capacity(class.attrs.len());

        for attr in std::mem::take(&mut class.attrs) {
            let Some(pos) = result.iter().position(|existing| *existing == attr) else {
                result.push(attr);
                continue;
            };
            if attr.is_attribute() || attr.is_enumeration() {
                continue;
            }

            let existing = &mut result[pos];
            let restrictions = &mut existing.restrictions;
            let min_occurs = restrictions.min_occurs.unwrap_or(0);
            let max_occurs = restrictions.max_occurs.unwrap_or(1);
            restrictions.min_occurs =
                Some(min_occurs.min(attr.restrictions.min_occurs.unwrap_or(0)));
            restrictions.max_occurs = Some(add_occurs(
                max_occurs,
                attr.restrictions.max_occurs.unwrap_or(1),
            ));
            restrictions.sequence = restrictions.sequence.or(attr.restrictions.sequence);
            existing.fixed = false;
        }

        class.attrs = result;
        Ok(())
    }
}
