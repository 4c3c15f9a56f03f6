use super::ContainerHandler;
use crate::container::ClassContainer;
use crate::models::ClassId;
use crate::{CodegenError, Result};
use std::collections::HashSet;

/// Check the invariants a renderer relies on.
///
/// - qualified names are unique across the registry
/// - no class is reachable twice, either registered twice or shared as an inner class
/// - every non native type points at an existing class with the same qname
/// - forward types point at an inner class of their own class
/// - every inner class points back at its outer class
#[derive(Debug)]
pub struct ValidateReferences;

impl ContainerHandler for ValidateReferences {
    fn run(&self, container: &mut ClassContainer) -> Result<()> {
        validate_unique_qualified_names(container)?;
        let classes = validate_unique_instances(container)?;
        validate_resolved_references(container, &classes)?;
        validate_parent_references(container)
    }
}

fn validate_unique_qualified_names(container: &ClassContainer) -> Result<()> {
    let mut seen = HashSet::new();
    for class in container.classes() {
        if !seen.insert(class.qname.as_str()) {
            return Err(CodegenError::DuplicateClass(class.qname.clone()));
        }
    }
    Ok(())
}

/// Every reachable class, failing on the first one reached twice.
fn validate_unique_instances(container: &ClassContainer) -> Result<HashSet<ClassId>> {
    let mut seen = HashSet::new();
    for id in container.all_ids() {
        if !seen.insert(id) {
            return Err(CodegenError::CrossReference(container.class(id).qname.clone()));
        }
    }
    Ok(seen)
}

fn validate_resolved_references(
    container: &ClassContainer,
    classes: &HashSet<ClassId>,
) -> Result<()> {
    for id in container.all_ids() {
        let class = container.class(id);
        let attrs = class
            .attrs
            .iter()
            .flat_map(|attr| attr.all_types().map(move |tp| (attr.name.as_str(), tp)));
        let extensions = class
            .extensions
            .iter()
            .map(|ext| (ext.tag.as_str(), &ext.r#type));

        for (attr, attr_type) in attrs.chain(extensions) {
            if attr_type.native {
                continue;
            }

            let Some(reference) = attr_type.reference.filter(|reference| classes.contains(reference))
            else {
                return Err(CodegenError::UnresolvedReference {
                    class: class.qname.clone(),
                    attr: attr.to_string(),
                    qname: attr_type.qname.clone(),
                });
            };
            if container.class(reference).qname != attr_type.qname
                || (attr_type.forward && !class.inner.contains(&reference))
            {
                return Err(CodegenError::MisrepresentedReference {
                    class: class.qname.clone(),
                    attr: attr.to_string(),
                    qname: attr_type.qname.clone(),
                });
            }
        }
    }
    Ok(())
}

fn validate_parent_references(container: &ClassContainer) -> Result<()> {
    for id in container.ids() {
        if container.class(id).parent.is_some() {
            return Err(CodegenError::InvalidParent(container.class(id).qname.clone()));
        }
        for outer in container.walk(id) {
            for inner in &container.class(outer).inner {
                if container.class(*inner).parent != Some(outer) {
                    return Err(CodegenError::InvalidParent(container.class(*inner).qname.clone()));
                }
            }
        }
    }
    Ok(())
}
