use super::ClassHandler;
use crate::container::ClassContainer;
use crate::datatype::{DataType, NativeKind};
use crate::models::{AttrType, ClassId, Tag, XmlType};
use crate::utils;
use crate::Result;
use std::collections::HashSet;
use tracing::warn;

/// Resolve the types of every attr.
///
/// Native types set the `tokens` and `format` hints of the attr. Simple type dependencies are
/// inlined: the attr takes over their value types and facets. Complex dependencies keep a
/// reference and get checked for cycles. Forward types resolve against the inner classes.
/// Unknown types fall back to `anySimpleType`.
#[derive(Debug)]
pub struct ProcessAttributeTypes;

impl ClassHandler for ProcessAttributeTypes {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let ignore_patterns = container.config().output.ignore_patterns;
        let mut absorbed = Vec::new();

        for index in 0..container.class(target).attrs.len() {
            if ignore_patterns {
                container.class_mut(target).attrs[index].restrictions.pattern = None;
            }

            let types = container.class(target).attrs[index].types.clone();
            let mut resolved = Vec::with_capacity(types.len());
            for attr_type in types {
                resolved.extend(process_type(container, target, index, attr_type, &mut absorbed)?);
            }

            let mut seen = HashSet::new();
            resolved.retain(|tp| seen.insert(tp.qname.clone()));

            let class = container.class_mut(target);
            class.attrs[index].types = resolved;
            cascade_properties(class, index);
        }

        // Inlined inner simple types are gone unless another forward type still uses them.
        for inner in absorbed {
            let qname = container.class(inner).qname.clone();
            let class = container.class_mut(target);
            if !class.types().any(|tp| tp.forward && tp.qname == qname) {
                class.inner.retain(|id| *id != inner);
            }
        }

        Ok(())
    }
}

impl ProcessAttributeTypes {
    /// Whether `source` depends back on `target`, directly or through other classes.
    ///
    /// Types already marked circular are not followed. Every qname is visited once.
    pub fn is_circular_dependency(
        container: &mut ClassContainer,
        source: ClassId,
        target: ClassId,
    ) -> Result<bool> {
        if source == target {
            return Ok(true);
        }

        let target_qname = container.class(target).qname.clone();
        let mut seen = HashSet::new();
        let mut stack = vec![source];

        while let Some(current) = stack.pop() {
            for qname in container.dependencies(current, false) {
                if qname == target_qname {
                    return Ok(true);
                }
                if !seen.insert(qname.clone()) {
                    continue;
                }
                if let Some(found) = container.find_any(&qname)? {
                    if found == target {
                        return Ok(true);
                    }
                    stack.push(found);
                }
            }
        }

        Ok(false)
    }
}

fn process_type(
    container: &mut ClassContainer,
    target: ClassId,
    index: usize,
    attr_type: AttrType,
    absorbed: &mut Vec<ClassId>,
) -> Result<Vec<AttrType>> {
    if attr_type.native {
        Ok(vec![process_native_type(container, target, index, attr_type)])
    } else if attr_type.forward {
        process_inner_type(container, target, index, attr_type, absorbed)
    } else {
        process_dependency_type(container, target, index, attr_type)
    }
}

fn process_native_type(
    container: &mut ClassContainer,
    target: ClassId,
    index: usize,
    mut attr_type: AttrType,
) -> AttrType {
    let Some(datatype) = attr_type.datatype() else {
        return attr_type;
    };

    let restrictions = &mut container.class_mut(target).attrs[index].restrictions;
    if datatype.is_tokens() {
        restrictions.tokens = Some(true);
    }
    if let Some(format) = datatype.format() {
        restrictions.format = Some(format.to_string());
    }
    if restrictions.pattern.is_some() && datatype.kind() != NativeKind::Str {
        attr_type.reset_native(DataType::String);
    }
    attr_type
}

fn process_inner_type(
    container: &mut ClassContainer,
    target: ClassId,
    index: usize,
    mut attr_type: AttrType,
    absorbed: &mut Vec<ClassId>,
) -> Result<Vec<AttrType>> {
    if attr_type.circular {
        return Ok(vec![attr_type]);
    }

    let inner = container.find_inner(target, &attr_type.qname)?;
    if container.class(inner).is_simple_type() {
        absorbed.push(inner);
        copy_attribute_properties(container, inner, target, index)
    } else {
        attr_type.reference = Some(inner);
        Ok(vec![attr_type])
    }
}

fn process_dependency_type(
    container: &mut ClassContainer,
    target: ClassId,
    index: usize,
    mut attr_type: AttrType,
) -> Result<Vec<AttrType>> {
    let tag = container.class(target).attrs[index].tag;
    let Some(source) = find_dependency(container, &attr_type.qname, tag)? else {
        warn!(
            class = %container.class(target).qname,
            attr = %container.class(target).attrs[index].name,
            r#type = %attr_type.qname,
            "unknown attribute type, falling back to anySimpleType"
        );
        attr_type.reset_native(DataType::AnySimpleType);
        return Ok(vec![attr_type]);
    };

    let source_class = container.class(source);
    if source_class.is_enumeration() {
        let restrictions = &mut container.class_mut(target).attrs[index].restrictions;
        restrictions.min_length = None;
        restrictions.max_length = None;
        attr_type.reference = Some(source);
        Ok(vec![attr_type])
    } else if source_class.is_simple_type() {
        copy_attribute_properties(container, source, target, index)
    } else {
        attr_type.reference = Some(source);
        attr_type.circular = ProcessAttributeTypes::is_circular_dependency(container, source, target)?;
        Ok(vec![attr_type])
    }
}

/// Same tag first, then complex types, then simple types, then anything with the qname.
fn find_dependency(container: &mut ClassContainer, qname: &str, tag: Tag) -> Result<Option<ClassId>> {
    if let Some(found) = container.find(qname, |class| class.tag == tag)? {
        return Ok(Some(found));
    }
    if let Some(found) = container.find(qname, |class| class.tag == Tag::ComplexType)? {
        return Ok(Some(found));
    }
    if let Some(found) = container.find(qname, |class| !class.is_complex())? {
        return Ok(Some(found));
    }
    container.find_any(qname)
}

/// Inline the value attr of the simple type `source` into the attr at `index`.
///
/// The attr keeps its own occurrences and compositor markers and wins on every facet it sets;
/// documentation, default and fixed values are inherited when missing.
fn copy_attribute_properties(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    index: usize,
) -> Result<Vec<AttrType>> {
    let source_attr = container.class(source).attrs[0].clone();
    let field_name = container.class(target).attrs[index].name.clone();

    let mut types = Vec::with_capacity(source_attr.types.len());
    for source_type in &source_attr.types {
        let mut clone = source_type.clone();
        utils::copy_inner_type(container, source, target, &field_name, &mut clone)?;
        types.push(clone);
    }

    let attr = &mut container.class_mut(target).attrs[index];
    let own = &attr.restrictions;
    let mut restrictions = source_attr.restrictions.clone();
    restrictions.merge(own);
    restrictions.min_occurs = own.min_occurs;
    restrictions.max_occurs = own.max_occurs;
    restrictions.required = own.required;
    restrictions.prohibited = own.prohibited;
    restrictions.choice = own.choice;
    restrictions.sequence = own.sequence;
    restrictions.sequential = own.sequential;
    restrictions.group = own.group;
    restrictions.path.clone_from(&own.path);

    attr.restrictions = restrictions;
    if attr.help.is_none() {
        attr.help = source_attr.help;
    }
    if attr.default.is_none() {
        attr.default = source_attr.default;
        attr.fixed = attr.fixed || source_attr.fixed;
    }

    Ok(types)
}

/// The text value of a simple content class takes the class default.
fn cascade_properties(class: &mut crate::models::Class, index: usize) {
    let (default, fixed) = (class.default.clone(), class.fixed);
    let attr = &mut class.attrs[index];
    if attr.xml_type() == XmlType::Text && !attr.is_enumeration() && attr.default.is_none() {
        attr.default = default;
        attr.fixed = fixed;
    }
}
