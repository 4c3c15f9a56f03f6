use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::ClassId;
use crate::namespaces;
use crate::Result;
use tracing::trace;

/// Promote inner classes to global classes.
///
/// Inner enumerations are always promoted, every other inner class only with
/// `output.unnest_classes`. A promoted class is renamed `{outer}_{inner}` and the forward
/// types that pointed at it become regular references.
#[derive(Debug)]
pub struct UnnestInnerClasses;

impl ClassHandler for UnnestInnerClasses {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let unnest_all = container.config().output.unnest_classes;

        for inner in container.class(target).inner.clone() {
            if unnest_all || container.class(inner).is_enumeration() {
                promote(container, target, inner);
            }
        }
        Ok(())
    }
}

fn promote(container: &mut ClassContainer, outer: ClassId, inner: ClassId) {
    let outer_name = container.class(outer).name().to_string();
    let inner_class = container.class(inner);
    let old_qname = inner_class.qname.clone();
    let new_qname = namespaces::build_qname(
        inner_class.target_namespace(),
        &format!("{outer_name}_{}", inner_class.name()),
    );
    trace!(from = %old_qname, to = %new_qname, "unnesting inner class");

    let inner_class = container.class_mut(inner);
    inner_class.qname.clone_from(&new_qname);
    inner_class.parent = None;
    inner_class.local_type = true;
    container.register(inner);

    let outer_class = container.class_mut(outer);
    outer_class.inner.retain(|id| *id != inner);
    for attr_type in outer_class.types_mut() {
        if attr_type.forward && attr_type.qname == old_qname {
            attr_type.forward = false;
            attr_type.qname.clone_from(&new_qname);
            attr_type.reference = Some(inner);
        }
    }
}
