//! Pre-processing merge of classes sharing a qualified name.
//!
//! Parsers emit one class per schema component, so a schema set that includes the same file
//! twice, redefines a component or wraps a complex type in a same-named element hands the
//! pipeline several classes for one qname. [`ClassValidator`] reduces every such group before
//! the first step runs.

use crate::container::ClassContainer;
use crate::handlers::ContainerHandler;
use crate::models::{ClassId, Tag};
use crate::utils;
use crate::Result;
use tracing::debug;

#[derive(Debug)]
pub struct ClassValidator;

impl ContainerHandler for ClassValidator {
    fn run(&self, container: &mut ClassContainer) -> Result<()> {
        let mut qnames: Vec<String> = Vec::new();
        for class in container.classes() {
            if !qnames.contains(&class.qname) {
                qnames.push(class.qname.clone());
            }
        }

        for qname in qnames {
            let mut ids = container.find_all(&qname);
            if ids.len() < 2 {
                continue;
            }

            remove_invalid_classes(container, &mut ids);
            remove_duplicate_classes(container, &mut ids);
            merge_redefined_classes(container, &mut ids)?;
            merge_global_element_type(container, &mut ids);
        }
        Ok(())
    }
}

/// Drop classes extending a type nobody defines, as long as one class of the group survives.
fn remove_invalid_classes(container: &mut ClassContainer, ids: &mut Vec<ClassId>) {
    let (invalid, valid): (Vec<ClassId>, Vec<ClassId>) = ids.iter().partition(|id| {
        container
            .class(**id)
            .extensions
            .iter()
            .any(|ext| !ext.r#type.native && container.first(&ext.r#type.qname).is_none())
    });

    if invalid.is_empty() || valid.is_empty() {
        return;
    }

    for id in invalid {
        debug!(qname = %container.class(id).qname, "dropping class with an undefined base");
        container.remove(id);
    }
    *ids = valid;
}

/// Keep the first of every set of structurally identical classes.
fn remove_duplicate_classes(container: &mut ClassContainer, ids: &mut Vec<ClassId>) {
    let mut kept: Vec<ClassId> = Vec::with_capacity(ids.len());
    for id in ids.drain(..) {
        if kept.iter().any(|other| container.same_content(*other, id)) {
            container.remove(id);
        } else {
            kept.push(id);
        }
    }
    *ids = kept;
}

/// Fold every redefine/override component into itself and drop the component it replaces.
///
/// A redefined group refers to the original through a group attr of its own name, a redefined
/// type extends a type of its own name. Both references are replaced by the original's attrs.
fn merge_redefined_classes(container: &mut ClassContainer, ids: &mut Vec<ClassId>) -> Result<()> {
    let redefinitions: Vec<ClassId> = ids
        .iter()
        .copied()
        .filter(|id| {
            matches!(
                container.class(*id).container,
                Some(Tag::Redefine | Tag::Override)
            )
        })
        .collect();

    for target in redefinitions {
        let tag = container.class(target).tag;
        let Some(source) = ids.iter().copied().find(|id| {
            *id != target
                && container.class(*id).tag == tag
                && !matches!(
                    container.class(*id).container,
                    Some(Tag::Redefine | Tag::Override)
                )
        }) else {
            continue;
        };

        let qname = container.class(target).qname.clone();
        while let Some(index) = container
            .class(target)
            .attrs
            .iter()
            .position(|attr| attr.is_group() && attr.types.iter().any(|tp| tp.qname == qname))
        {
            utils::copy_group_attributes(container, source, target, index)?;
        }

        let extensions: Vec<_> = container
            .class(target)
            .extensions
            .iter()
            .filter(|ext| ext.r#type.qname == qname)
            .cloned()
            .collect();
        for extension in &extensions {
            utils::copy_attributes(container, source, target, extension)?;
        }

        debug!(%qname, "merged redefined class");
        container.remove(source);
        ids.retain(|id| *id != source);
    }
    Ok(())
}

/// Merge an element that only wraps the complex type of the same name into that type.
fn merge_global_element_type(container: &mut ClassContainer, ids: &mut Vec<ClassId>) {
    let Some(element) = ids.iter().copied().find(|id| {
        let class = container.class(*id);
        class.is_element()
            && class.attrs.is_empty()
            && class.extensions.len() == 1
            && !class.extensions[0].r#type.native
            && class.extensions[0].r#type.qname == class.qname
    }) else {
        return;
    };
    let Some(complex) = ids
        .iter()
        .copied()
        .find(|id| container.class(*id).tag == Tag::ComplexType)
    else {
        return;
    };

    let wrapper = container.class(element).clone();
    let class = container.class_mut(complex);
    if wrapper.namespace.is_some() {
        class.namespace = wrapper.namespace;
    }
    if wrapper.help.is_some() {
        class.help = wrapper.help;
    }
    class.substitutions = wrapper.substitutions;
    class.nillable |= wrapper.nillable;
    class.r#abstract = wrapper.r#abstract;
    class.tag = Tag::Element;

    debug!(qname = %wrapper.qname, "merged element into its complex type");
    container.remove(element);
    ids.retain(|id| *id != element);
}
