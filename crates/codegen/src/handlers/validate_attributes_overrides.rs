use super::{base_classes, ClassHandler};
use crate::container::ClassContainer;
use crate::models::{Attr, ClassId, UNBOUNDED};
use crate::text;
use crate::utils;
use crate::Result;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Check attrs that shadow an inherited attr.
///
/// A restatement that changes nothing is dropped and a real override stays. Overrides changing
/// the type, including a narrowed `anyType`, always count as real. A clash between different
/// kinds of nodes renames the derived attr.
#[derive(Debug)]
pub struct ValidateAttributesOverrides;

impl ClassHandler for ValidateAttributesOverrides {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let inherited = base_attrs_map(container, target)?;
        if inherited.is_empty() {
            return Ok(());
        }

        for index in (0..container.class(target).attrs.len()).rev() {
            let attr = &container.class(target).attrs[index];
            let Some(&(base, base_index)) = inherited.get(&attr.slug()) else {
                continue;
            };
            let base_attr = &container.class(base).attrs[base_index];

            if !overrides(attr, base_attr) {
                resolve_conflict(container, target, index, &inherited);
                continue;
            }

            // A restriction narrowing a wildcard type keeps its own field.
            if base_attr.is_any_type() && !attr.is_any_type() {
                continue;
            }

            if attr.is_list() && !base_attr.is_list() && !base_attr.is_prohibited() {
                warn!(
                    class = %container.class(target).qname,
                    attr = %attr.name,
                    base = %container.class(base).qname,
                    "list attribute overrides a single value, widening the base attribute"
                );
                container.class_mut(base).attrs[base_index].restrictions.max_occurs =
                    Some(UNBOUNDED);
            }

            let attr = &container.class(target).attrs[index];
            let base_attr = &container.class(base).attrs[base_index];
            if is_redundant(attr, base_attr) {
                utils::remove_attribute(container, target, index);
            }
        }
        Ok(())
    }
}

/// Nearest inherited attr for every slug.
fn base_attrs_map(
    container: &mut ClassContainer,
    target: ClassId,
) -> Result<HashMap<String, (ClassId, usize)>> {
    let mut result = HashMap::new();
    for base in base_classes(container, target)? {
        for (index, attr) in container.class(base).attrs.iter().enumerate() {
            result.entry(attr.slug()).or_insert((base, index));
        }
    }
    Ok(result)
}

fn overrides(attr: &Attr, base: &Attr) -> bool {
    attr.xml_type() == base.xml_type() && attr.namespace == base.namespace
}

fn is_redundant(attr: &Attr, base: &Attr) -> bool {
    let own = attr.types.iter().map(|tp| &tp.qname);
    let inherited = base.types.iter().map(|tp| &tp.qname);

    own.eq(inherited)
        && attr.default == base.default
        && attr.fixed == base.fixed
        && attr.mixed == base.mixed
        && attr.restrictions.is_tokens() == base.restrictions.is_tokens()
        && attr.is_nillable() == base.is_nillable()
        && attr.is_prohibited() == base.is_prohibited()
        && attr.is_optional() == base.is_optional()
}

fn resolve_conflict(
    container: &mut ClassContainer,
    target: ClassId,
    index: usize,
    inherited: &HashMap<String, (ClassId, usize)>,
) {
    let class = container.class_mut(target);
    let reserved: HashSet<String> = class
        .attrs
        .iter()
        .map(Attr::slug)
        .chain(inherited.keys().cloned())
        .collect();

    let attr = &mut class.attrs[index];
    let name = text::unique_name(&format!("{}_{}", attr.field_name(), attr.tag), &reserved);
    attr.rename(name);
}
