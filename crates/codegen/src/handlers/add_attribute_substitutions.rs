use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{Attr, AttrType, ClassId, PathEntry};
use crate::utils;
use crate::Result;
use std::cell::OnceCell;
use std::collections::{HashMap, HashSet};

/// Expand substitution group heads into the elements that may replace them.
///
/// Every non-abstract member is inserted after its head as an optional attr sharing the head's
/// choice, so a compound field can later treat them as alternatives. An abstract head is dropped
/// once its members are in place. Types already expanded are marked `substituted` and never
/// expanded twice.
#[derive(Debug, Default)]
pub struct AddAttributeSubstitutions {
    /// Built on first use.
    substitutions: OnceCell<SubstitutionGroups>,
}

#[derive(Debug, Default)]
struct SubstitutionGroups {
    /// Head qname to the attrs of its non-abstract members.
    members: HashMap<String, Vec<Attr>>,
    /// Abstract elements, which never appear in a document themselves.
    abstract_elements: HashSet<String>,
}

impl ClassHandler for AddAttributeSubstitutions {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        if container.class(target).is_enumeration() {
            return Ok(());
        }

        let mut index = 0;
        while index < container.class(target).attrs.len() {
            if !container.class(target).attrs[index].is_enumeration()
                && self.process_attribute(container, target, index)
            {
                continue;
            }
            index += 1;
        }
        Ok(())
    }
}

impl AddAttributeSubstitutions {
    /// Insert the members of every substitution group the attr at `index` heads.
    ///
    /// Returns whether the attr itself was removed, which happens to an abstract head with at
    /// least one member.
    pub fn process_attribute(
        &self,
        container: &mut ClassContainer,
        target: ClassId,
        index: usize,
    ) -> bool {
        let substitutions = self
            .substitutions
            .get_or_init(|| create_substitutions(container));

        let mut inserted = 0;
        let type_count = container.class(target).attrs[index].types.len();
        for type_index in 0..type_count {
            let attr_type = &mut container.class_mut(target).attrs[index].types[type_index];
            if attr_type.substituted || attr_type.native || attr_type.forward {
                continue;
            }
            attr_type.substituted = true;
            let head_qname = attr_type.qname.clone();

            let Some(members) = substitutions.members.get(&head_qname) else {
                continue;
            };

            for member in members {
                prepare_substituted(container, target, index);

                let head = &container.class(target).attrs[index];
                let mut clone = utils::clone_attribute(member, &head.restrictions);
                clone.restrictions.min_occurs = Some(0);
                clone.restrictions.choice = head.restrictions.choice;
                clone.substitution = Some(head_qname.clone());

                let attrs = &mut container.class_mut(target).attrs;
                if !attrs.contains(&clone) {
                    inserted += 1;
                    attrs.insert(index + inserted, clone);
                }
            }
        }

        let head = &container.class(target).attrs[index];
        let is_abstract = match head.types.as_slice() {
            [attr_type] => substitutions.abstract_elements.contains(&attr_type.qname),
            _ => false,
        };
        if inserted > 0 && is_abstract {
            container.class_mut(target).attrs.remove(index);
            return true;
        }
        false
    }
}

/// The head becomes optional and gets a choice of its own if it had none.
fn prepare_substituted(container: &mut ClassContainer, target: ClassId, index: usize) {
    let choice = match container.class(target).attrs[index].restrictions.choice {
        Some(choice) => choice,
        None => {
            let choice = container.next_group_id();
            let restrictions = &mut container.class_mut(target).attrs[index].restrictions;
            restrictions.choice = Some(choice);
            restrictions.path.insert(0, PathEntry::choice(choice, 1, 1));
            choice
        }
    };

    let restrictions = &mut container.class_mut(target).attrs[index].restrictions;
    restrictions.min_occurs = Some(0);
    restrictions.choice = Some(choice);
}

fn create_substitutions(container: &ClassContainer) -> SubstitutionGroups {
    let mut result = SubstitutionGroups::default();
    for class in container.classes() {
        if class.r#abstract {
            if class.is_element() {
                result.abstract_elements.insert(class.qname.clone());
            }
            continue;
        }

        for head in &class.substitutions {
            let mut attr = Attr::new(class.tag, class.name(), AttrType::new(class.qname.clone()));
            attr.namespace.clone_from(&class.namespace);
            result.members.entry(head.clone()).or_default().push(attr);
        }
    }
    result
}
