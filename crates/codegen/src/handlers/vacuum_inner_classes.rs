use super::ClassHandler;
use crate::container::ClassContainer;
use crate::datatype::DataType;
use crate::models::ClassId;
use crate::namespaces;
use crate::utils;
use crate::Result;
use std::collections::HashSet;

/// Tidy up the inner classes of a class.
///
/// Duplicates and inner classes with no content are dropped, the latter by pointing their
/// forward types at whatever they extended. An inner class named like its outer class gets an
/// `_Inner` suffix so the two can live in the same module.
#[derive(Debug)]
pub struct VacuumInnerClasses;

impl ClassHandler for VacuumInnerClasses {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let mut seen = HashSet::new();
        let inner: Vec<ClassId> = container
            .class(target)
            .inner
            .iter()
            .copied()
            .filter(|id| seen.insert(container.class(*id).qname.clone()))
            .collect();
        container.class_mut(target).inner = inner.clone();

        for id in inner {
            let class = container.class(id);
            if class.attrs.is_empty() && class.extensions.len() < 2 {
                remove_inner(container, target, id);
            } else if class.qname == container.class(target).qname {
                rename_inner(container, target, id);
            }
        }

        utils::clean_inner_classes(container, target);
        Ok(())
    }
}

fn remove_inner(container: &mut ClassContainer, target: ClassId, inner: ClassId) {
    let class = container.class(inner);
    let qname = class.qname.clone();
    let replacement = class.extensions.first().map(|ext| ext.r#type.clone());

    let outer = container.class_mut(target);
    outer.inner.retain(|id| *id != inner);
    for attr_type in outer.types_mut() {
        if !attr_type.forward || attr_type.qname != qname {
            continue;
        }
        match &replacement {
            Some(base) => {
                attr_type.qname.clone_from(&base.qname);
                attr_type.reference = base.reference;
                attr_type.native = base.native;
                attr_type.forward = false;
            }
            None => attr_type.reset_native(DataType::AnyType),
        }
    }
}

fn rename_inner(container: &mut ClassContainer, target: ClassId, inner: ClassId) {
    let class = container.class_mut(inner);
    let old_qname = class.qname.clone();
    class.qname = namespaces::build_qname(
        class.target_namespace(),
        &format!("{}_Inner", class.name()),
    );
    let new_qname = class.qname.clone();

    for attr_type in container.class_mut(target).types_mut() {
        if attr_type.forward && attr_type.qname == old_qname {
            attr_type.qname.clone_from(&new_qname);
        }
    }
}
