//! Attribute and inner class copying shared by the handlers.
//!
//! Attrs are always cloned when they move between classes; two classes never share an attr.

use crate::container::ClassContainer;
use crate::models::{Attr, AttrType, ClassId, Extension, Restrictions, Tag};
use crate::namespaces;
use crate::{CodegenError, Result};
use std::collections::HashSet;

/// Clone `attr` with `restrictions` merged over its own.
pub fn clone_attribute(attr: &Attr, restrictions: &Restrictions) -> Attr {
    let mut clone = attr.clone();
    clone.restrictions.merge(restrictions);
    clone
}

/// Copy the attrs of the extension base `source` into `target` and drop the extension.
///
/// Base attrs go ahead of the target's own attrs in source order, attrs the target already
/// declares (same name and tag) are skipped and suffix attrs are appended last.
pub fn copy_attributes(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    extension: &Extension,
) -> Result<()> {
    let target_class = container.class_mut(target);
    if let Some(pos) = target_class.extensions.iter().position(|ext| ext == extension) {
        target_class.extensions.remove(pos);
    }

    let declared: HashSet<(String, Tag)> = target_class
        .attrs
        .iter()
        .map(|attr| (attr.name.clone(), attr.tag))
        .collect();

    let source_attrs = container.class(source).attrs.clone();
    let mut index = 0;
    for attr in &source_attrs {
        if declared.contains(&(attr.name.clone(), attr.tag)) {
            index += 1;
            continue;
        }

        let clone = clone_attribute(attr, &extension.restrictions);
        let attrs = &mut container.class_mut(target).attrs;
        let position = if attr.is_suffix() {
            attrs.push(clone);
            attrs.len() - 1
        } else {
            let position = index.min(attrs.len());
            attrs.insert(position, clone);
            index += 1;
            position
        };

        copy_inner_classes(container, source, target, position)?;
    }

    Ok(())
}

/// Replace the group reference at `attr_index` with clones of the group's attrs.
pub fn copy_group_attributes(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    attr_index: usize,
) -> Result<()> {
    let group_attr = container.class_mut(target).attrs.remove(attr_index);
    let source_attrs = container.class(source).attrs.clone();

    let mut index = attr_index;
    for attr in &source_attrs {
        let clone = clone_attribute(attr, &group_attr.restrictions);
        let attrs = &mut container.class_mut(target).attrs;
        if attrs.contains(&clone) {
            continue;
        }
        attrs.insert(index, clone);
        copy_inner_classes(container, source, target, index)?;
        index += 1;
    }

    Ok(())
}

/// Copy the inner classes the forward types of `target.attrs[attr_index]` point at.
pub fn copy_inner_classes(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    attr_index: usize,
) -> Result<()> {
    let total = container.class(target).attrs[attr_index].types.len();
    for type_index in 0..total {
        copy_inner_class(container, source, target, attr_index, type_index)?;
    }
    Ok(())
}

/// Copy the inner class of `source` referenced by one forward type of a `target` attr.
///
/// An inner class that is the target itself turns the type into a circular self reference.
/// A copied inner class named after `source` is renamed after the field, so copies coming from
/// different bases don't end up with the same name.
pub fn copy_inner_class(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    attr_index: usize,
    type_index: usize,
) -> Result<()> {
    let attr = &container.class(target).attrs[attr_index];
    let mut attr_type = attr.types[type_index].clone();
    let field_name = attr.name.clone();

    copy_inner_type(container, source, target, &field_name, &mut attr_type)?;
    container.class_mut(target).attrs[attr_index].types[type_index] = attr_type;
    Ok(())
}

/// Same as [`copy_inner_class`] for a type not attached to any attr yet.
pub fn copy_inner_type(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    field_name: &str,
    attr_type: &mut AttrType,
) -> Result<()> {
    if !attr_type.forward {
        return Ok(());
    }

    let inner = find_inner(container, source, &attr_type.qname)?;
    if inner == target {
        attr_type.circular = true;
        attr_type.forward = false;
        attr_type.reference = Some(target);
        return Ok(());
    }

    let renamed = if container.class(inner).name() == container.class(source).name() {
        let namespace = container.class(inner).target_namespace();
        Some(namespaces::build_qname(namespace, field_name))
    } else {
        None
    };

    let clone = container.clone_class(inner);
    let (package, module) = {
        let target_class = container.class(target);
        (target_class.package.clone(), target_class.module.clone())
    };

    let clone_class = container.class_mut(clone);
    clone_class.package = package;
    clone_class.module = module;
    clone_class.parent = Some(target);
    if let Some(qname) = &renamed {
        clone_class.qname.clone_from(qname);
    }

    container.class_mut(target).inner.push(clone);
    attr_type.reference = Some(clone);
    if let Some(qname) = renamed {
        attr_type.qname = qname;
    }

    Ok(())
}

/// Inner class of `source` with the given qname.
pub fn find_inner(container: &ClassContainer, source: ClassId, qname: &str) -> Result<ClassId> {
    let source_class = container.class(source);
    source_class
        .inner
        .iter()
        .copied()
        .find(|id| container.class(*id).qname == qname)
        .ok_or_else(|| CodegenError::missing_inner(&source_class.qname, qname))
}

/// Drop inner classes no forward type of `target` points at anymore.
pub fn clean_inner_classes(container: &mut ClassContainer, target: ClassId) {
    let class = container.class(target);
    let used: HashSet<String> = class
        .types()
        .filter(|tp| tp.forward)
        .map(|tp| tp.qname.clone())
        .collect();

    let keep: Vec<ClassId> = class
        .inner
        .iter()
        .copied()
        .filter(|id| used.contains(&container.class(*id).qname))
        .collect();

    container.class_mut(target).inner = keep;
}

/// Remove the attr at `index` together with the inner classes only it used.
pub fn remove_attribute(container: &mut ClassContainer, target: ClassId, index: usize) -> Attr {
    let attr = container.class_mut(target).attrs.remove(index);
    clean_inner_classes(container, target);
    attr
}
