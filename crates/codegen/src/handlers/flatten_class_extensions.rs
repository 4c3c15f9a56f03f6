use super::ClassHandler;
use crate::container::ClassContainer;
use crate::datatype::DataType;
use crate::models::{Attr, AttrType, Class, ClassId, Extension, Restrictions, Tag, XmlType};
use crate::namespaces::ANY_NAMESPACE;
use crate::utils;
use crate::{CodegenError, Result};
use std::collections::HashSet;
use tracing::warn;

/// Name of the attr holding the text value of a simple content class.
pub(crate) const DEFAULT_ATTR_NAME: &str = "value";

/// Resolve class extensions.
///
/// Every extension is either removed, flattened (the base attrs are copied into the class) or
/// kept as a real inheritance link with its reference set.
#[derive(Debug)]
pub struct FlattenClassExtensions;

impl ClassHandler for FlattenClassExtensions {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let extensions = container.class(target).extensions.clone();
        for extension in &extensions {
            if extension.r#type.native {
                process_native_extension(container.class_mut(target), extension);
            } else {
                process_dependency_extension(container, target, extension)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Native bases
// ============================================================================

fn process_native_extension(target: &mut Class, extension: &Extension) {
    if target.is_enumeration() {
        for attr in &mut target.attrs {
            attr.types = vec![extension.r#type.clone()];
        }
        remove_extension(target, extension);
    } else {
        add_default_attribute(target, extension);
    }
}

/// Turn a native extension into the text value attr of the class.
///
/// An `anyType` base becomes a wildcard instead.
pub(crate) fn add_default_attribute(target: &mut Class, extension: &Extension) {
    let (tag, name, namespace) = if extension.r#type.datatype() == Some(DataType::AnyType) {
        (Tag::Any, "@any_element", Some(ANY_NAMESPACE.to_string()))
    } else {
        (Tag::Extension, DEFAULT_ATTR_NAME, None)
    };

    let index = match target.attrs.iter().position(|attr| attr.name == name) {
        Some(index) => index,
        None => {
            let mut attr = Attr::untyped(tag, name);
            attr.restrictions = Restrictions::occurs(1, 1);
            target.attrs.insert(0, attr);
            0
        }
    };

    let attr = &mut target.attrs[index];
    attr.types.push(extension.r#type.clone());
    attr.restrictions.merge(&extension.restrictions);
    attr.namespace = namespace;

    remove_extension(target, extension);
}

// ============================================================================
// Class bases
// ============================================================================

fn process_dependency_extension(
    container: &mut ClassContainer,
    target: ClassId,
    extension: &Extension,
) -> Result<()> {
    let Some(source) = find_dependency(container, &extension.r#type.qname)? else {
        warn!(
            class = %container.class(target).qname,
            extension = %extension.r#type.qname,
            "missing extension type"
        );
        remove_extension(container.class_mut(target), extension);
        return Ok(());
    };

    let source_class = container.class(source);
    if container.class(target).is_enumeration()
        || source_class.is_enumeration()
        || !source_class.is_complex()
    {
        process_simple_extension(container, source, target, extension)
    } else {
        process_complex_extension(container, source, target, extension)
    }
}

/// Simple types first, then complex types, then anything with the qname.
fn find_dependency(container: &mut ClassContainer, qname: &str) -> Result<Option<ClassId>> {
    if let Some(found) = container.find(qname, |class| class.tag == Tag::SimpleType)? {
        return Ok(Some(found));
    }
    if let Some(found) = container.find(qname, |class| class.tag == Tag::ComplexType)? {
        return Ok(Some(found));
    }
    container.find_any(qname)
}

fn process_simple_extension(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    extension: &Extension,
) -> Result<()> {
    if source == target {
        remove_extension(container.class_mut(target), extension);
        Ok(())
    } else if container.class(source).is_enumeration() || container.class(target).is_enumeration()
    {
        process_enum_extension(container, source, target, extension)
    } else {
        utils::copy_attributes(container, source, target, extension)
    }
}

fn process_enum_extension(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    extension: &Extension,
) -> Result<()> {
    let source_class = container.class(source);
    let target_class = container.class(target);

    match (source_class.is_enumeration(), target_class.is_enumeration()) {
        (true, true) => {
            let members: Vec<Attr> = target_class
                .attrs
                .iter()
                .map(|attr| {
                    source_class
                        .attrs
                        .iter()
                        .find(|member| member.name == attr.name)
                        .unwrap_or(attr)
                        .clone()
                })
                .collect();

            let target_class = container.class_mut(target);
            target_class.attrs = members;
            remove_extension(target_class, extension);
        }
        (true, false) => add_default_attribute(container.class_mut(target), extension),
        (false, true) if !source_class.is_complex() || source_class.is_simple_type() => {
            let types: Vec<AttrType> = source_class
                .attrs
                .iter()
                .filter(|attr| !attr.is_enumeration())
                .flat_map(|attr| attr.types.iter().cloned())
                .collect();

            let target_class = container.class_mut(target);
            if !types.is_empty() {
                for member in &mut target_class.attrs {
                    member.types.clone_from(&types);
                }
            }
            remove_extension(target_class, extension);
        }
        (false, true) => merge_complex_enumeration(container, source, target, extension)?,
        (false, false) => utils::copy_attributes(container, source, target, extension)?,
    }

    Ok(())
}

/// An enumeration restricting a complex type with simple content.
///
/// A single member becomes the fixed default of the text value attr; several members keep the
/// enumeration and adopt the value type, which only works when the text value is all there is.
fn merge_complex_enumeration(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    extension: &Extension,
) -> Result<()> {
    let source_class = container.class(source);
    let target_class = container.class(target);

    let ambiguous = || CodegenError::AmbiguousEnumExtension {
        target: target_class.qname.clone(),
        base: source_class.qname.clone(),
    };

    let carriers: Vec<usize> = source_class
        .attrs
        .iter()
        .enumerate()
        .filter(|(_, attr)| attr.xml_type() == XmlType::Text)
        .map(|(index, _)| index)
        .collect();
    let &[carrier] = carriers.as_slice() else {
        return Err(ambiguous());
    };

    if target_class.attrs.len() == 1 {
        let member_default = target_class.attrs[0].default.clone();
        let mut attrs = source_class.attrs.clone();
        attrs[carrier].default = member_default;
        attrs[carrier].fixed = true;

        let target_class = container.class_mut(target);
        target_class.attrs = attrs;
        remove_extension(target_class, extension);
        Ok(())
    } else if source_class.attrs.len() == 1 {
        let types = source_class.attrs[carrier].types.clone();
        let target_class = container.class_mut(target);
        for member in &mut target_class.attrs {
            member.types.clone_from(&types);
        }
        remove_extension(target_class, extension);
        Ok(())
    } else {
        Err(ambiguous())
    }
}

fn process_complex_extension(
    container: &mut ClassContainer,
    source: ClassId,
    target: ClassId,
    extension: &Extension,
) -> Result<()> {
    if should_remove_extension(container, source, target) {
        remove_extension(container.class_mut(target), extension);
        Ok(())
    } else if should_flatten_extension(container.class(source), container.class(target), extension)
    {
        utils::copy_attributes(container, source, target, extension)
    } else {
        let target_class = container.class_mut(target);
        if let Some(kept) = target_class.extensions.iter_mut().find(|ext| *ext == extension) {
            kept.r#type.reference = Some(source);
        }
        Ok(())
    }
}

/// Identity extensions, extensions of an enclosing class, and bases that would break the
/// method resolution order of the target.
fn should_remove_extension(container: &ClassContainer, source: ClassId, target: ClassId) -> bool {
    if source == target {
        return true;
    }

    let source_class = container.class(source);
    let target_class = container.class(target);
    if target_class.parent == Some(source) || target_class.inner.contains(&source) {
        return true;
    }

    let target_bases: HashSet<&str> = target_class
        .extensions
        .iter()
        .map(|ext| ext.r#type.qname.as_str())
        .collect();

    source_class
        .extensions
        .iter()
        .any(|ext| target_bases.contains(ext.r#type.qname.as_str()))
}

fn should_flatten_extension(source: &Class, target: &Class, extension: &Extension) -> bool {
    !source.is_complex()
        || source.is_simple_type()
        || target.has_suffix_attr()
        || (source.has_suffix_attr() && !target.attrs.is_empty())
        || (extension.tag == Tag::Restriction
            && (sequence_mismatch(source, target) || type_mismatch(source, target)))
}

/// Shared attrs appear in a different order in the restricting class.
fn sequence_mismatch(source: &Class, target: &Class) -> bool {
    let source_names: HashSet<&str> = source.attrs.iter().map(|attr| attr.name.as_str()).collect();
    let target_names: HashSet<&str> = target.attrs.iter().map(|attr| attr.name.as_str()).collect();

    let in_target = target
        .attrs
        .iter()
        .map(|attr| attr.name.as_str())
        .filter(|name| source_names.contains(name));
    let in_source = source
        .attrs
        .iter()
        .map(|attr| attr.name.as_str())
        .filter(|name| target_names.contains(name));

    !in_target.eq(in_source)
}

/// A restricting attr changes the type of the attr it overrides.
fn type_mismatch(source: &Class, target: &Class) -> bool {
    target.attrs.iter().any(|attr| {
        source
            .attrs
            .iter()
            .find(|base| base.name == attr.name && base.tag == attr.tag)
            .is_some_and(|base| {
                let own = attr.types.iter().map(|tp| &tp.qname);
                let inherited = base.types.iter().map(|tp| &tp.qname);
                !own.eq(inherited)
            })
    })
}

fn remove_extension(target: &mut Class, extension: &Extension) {
    if let Some(pos) = target.extensions.iter().position(|ext| ext == extension) {
        target.extensions.remove(pos);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::models::SUFFIX_INDEX;
    use crate::testing::{AttrFactory, ClassFactory, ExtensionFactory};
    use pretty_assertions::assert_eq;

    fn names(class: &Class) -> Vec<&str> {
        class.attrs.iter().map(|attr| attr.name.as_str()).collect()
    }

    fn container() -> ClassContainer {
        ClassContainer::new(GeneratorConfig::default())
    }

    #[test]
    fn test_native_extension_becomes_value_attr() {
        let mut container = container();
        let mut class = ClassFactory::elements("{urn:a}price", &["unit"]);
        let mut extension = ExtensionFactory::native(DataType::Decimal);
        extension.restrictions.min_inclusive = Some("0".into());
        class.extensions.push(extension);
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert_eq!(names(class), vec!["value", "unit"]);
        assert_eq!(class.attrs[0].tag, Tag::Extension);
        assert_eq!(class.attrs[0].types[0].datatype(), Some(DataType::Decimal));
        assert_eq!(class.attrs[0].restrictions.min_inclusive.as_deref(), Some("0"));
        assert!(class.extensions.is_empty());
    }

    #[test]
    fn test_any_type_extension_becomes_wildcard() {
        let mut container = container();
        let mut class = ClassFactory::create("{urn:a}open", Tag::ComplexType);
        class.extensions.push(ExtensionFactory::native(DataType::AnyType));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let attr = &container.class(id).attrs[0];
        assert_eq!(attr.tag, Tag::Any);
        assert_eq!(attr.name, "@any_element");
        assert_eq!(attr.namespace.as_deref(), Some(ANY_NAMESPACE));
    }

    #[test]
    fn test_native_extension_of_enumeration_replaces_member_types() {
        let mut container = container();
        let mut class = ClassFactory::enumeration("{urn:a}size", &["1", "2"]);
        class.extensions.push(ExtensionFactory::native(DataType::Int));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert!(class.is_enumeration());
        assert!(class
            .attrs
            .iter()
            .all(|attr| attr.types[0].datatype() == Some(DataType::Int)));
        assert!(class.extensions.is_empty());
    }

    #[test]
    fn test_missing_base_drops_extension() {
        let mut container = container();
        let mut class = ClassFactory::elements("{urn:a}t", &["a"]);
        class.extensions.push(ExtensionFactory::reference("{urn:ext}missing"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        assert!(container.class(id).extensions.is_empty());
        assert_eq!(names(container.class(id)), vec!["a"]);
    }

    #[test]
    fn test_complex_base_is_kept_as_inheritance() {
        let mut container = container();
        let base = container.add(ClassFactory::elements("{urn:a}base", &["a", "b"]));
        let mut class = ClassFactory::elements("{urn:a}derived", &["c"]);
        class.extensions.push(ExtensionFactory::reference("{urn:a}base"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert_eq!(class.extensions.len(), 1);
        assert_eq!(class.extensions[0].r#type.reference, Some(base));
        assert_eq!(names(class), vec!["c"]);
    }

    #[test]
    fn test_self_extension_is_removed() {
        let mut container = container();
        let mut class = ClassFactory::elements("{urn:a}redefined", &["a"]);
        class.extensions.push(ExtensionFactory::reference("{urn:a}redefined"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        assert!(container.class(id).extensions.is_empty());
        assert_eq!(container.class(id).attrs.len(), 1);
    }

    #[test]
    fn test_shared_bases_remove_extension() {
        let mut container = container();
        container.add(ClassFactory::elements("{urn:a}root", &["r"]));

        let mut middle = ClassFactory::elements("{urn:a}middle", &["m"]);
        middle.extensions.push(ExtensionFactory::reference("{urn:a}root"));
        container.add(middle);

        let mut leaf = ClassFactory::elements("{urn:a}leaf", &["l"]);
        leaf.extensions.push(ExtensionFactory::reference("{urn:a}middle"));
        leaf.extensions.push(ExtensionFactory::reference("{urn:a}root"));
        let leaf = container.add(leaf);

        FlattenClassExtensions.process(&mut container, leaf).unwrap();

        let extensions: Vec<&str> = container
            .class(leaf)
            .extensions
            .iter()
            .map(|ext| ext.r#type.qname.as_str())
            .collect();
        assert_eq!(extensions, vec!["{urn:a}root"]);
        assert_eq!(names(container.class(leaf)), vec!["l"]);
    }

    #[test]
    fn test_suffix_attr_forces_flattening() {
        let mut container = container();
        let mut base = ClassFactory::elements("{urn:a}base", &["a", "b"]);
        let mut wildcard = AttrFactory::any();
        wildcard.index = SUFFIX_INDEX;
        base.attrs.push(wildcard);
        container.add(base);

        let mut class = ClassFactory::elements("{urn:a}derived", &["b", "c"]);
        class.extensions.push(ExtensionFactory::reference("{urn:a}base"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert!(class.extensions.is_empty());
        assert_eq!(names(class), vec!["a", "b", "c", "@any"]);
    }

    #[test]
    fn test_reordering_restriction_is_flattened() {
        let mut container = container();
        container.add(ClassFactory::elements("{urn:a}base", &["a", "b"]));

        let mut class = ClassFactory::elements("{urn:a}derived", &["b", "a"]);
        class.extensions.push(ExtensionFactory::restriction("{urn:a}base"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert!(class.extensions.is_empty());
        assert_eq!(names(class), vec!["b", "a"]);
    }

    #[test]
    fn test_compatible_restriction_is_kept() {
        let mut container = container();
        container.add(ClassFactory::elements("{urn:a}base", &["a", "b"]));

        let mut class = ClassFactory::elements("{urn:a}derived", &["a"]);
        class.extensions.push(ExtensionFactory::restriction("{urn:a}base"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        assert_eq!(container.class(id).extensions.len(), 1);
    }

    #[test]
    fn test_enumeration_restriction_takes_base_members() {
        let mut container = container();
        let mut base = ClassFactory::enumeration("{urn:a}color", &["red", "green", "blue"]);
        for member in &mut base.attrs {
            member.types = vec![AttrType::native(DataType::Token)];
        }
        container.add(base);

        let mut class = ClassFactory::enumeration("{urn:a}warm", &["red"]);
        class.extensions.push(ExtensionFactory::restriction("{urn:a}color"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert_eq!(names(class), vec!["red"]);
        assert_eq!(class.attrs[0].types[0].datatype(), Some(DataType::Token));
        assert!(class.extensions.is_empty());
    }

    #[test]
    fn test_single_member_enumeration_of_complex_base() {
        let mut container = container();
        let mut base = ClassFactory::create("{urn:a}amount", Tag::ComplexType);
        base.attrs.push(AttrFactory::native(Tag::Extension, "value", DataType::Decimal));
        base.attrs.push(AttrFactory::attribute("currency"));
        container.add(base);

        let mut class = ClassFactory::enumeration("{urn:a}zero", &["0"]);
        class.extensions.push(ExtensionFactory::restriction("{urn:a}amount"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert_eq!(names(class), vec!["value", "currency"]);
        assert_eq!(class.attrs[0].default.as_deref(), Some("0"));
        assert!(class.attrs[0].fixed);
    }

    #[test]
    fn test_ambiguous_enumeration_of_complex_base() {
        let mut container = container();
        let mut base = ClassFactory::create("{urn:a}amount", Tag::ComplexType);
        base.attrs.push(AttrFactory::native(Tag::Extension, "value", DataType::Decimal));
        base.attrs.push(AttrFactory::attribute("currency"));
        container.add(base);

        let mut class = ClassFactory::enumeration("{urn:a}some", &["0", "1"]);
        class.extensions.push(ExtensionFactory::restriction("{urn:a}amount"));
        let id = container.add(class);

        let err = FlattenClassExtensions.process(&mut container, id).unwrap_err();
        assert!(matches!(
            &err,
            CodegenError::AmbiguousEnumExtension { base, .. } if base == "{urn:a}amount"
        ));
        assert_eq!(
            err.to_string(),
            "Enumeration class with a complex extension: `{urn:a}some` -> `{urn:a}amount`"
        );
    }

    #[test]
    fn test_enumeration_base_becomes_value_type() {
        let mut container = container();
        container.add(ClassFactory::enumeration("{urn:a}color", &["red"]));

        let mut class = ClassFactory::create("{urn:a}paint", Tag::ComplexType);
        class.attrs.push(AttrFactory::attribute("brand"));
        class.extensions.push(ExtensionFactory::reference("{urn:a}color"));
        let id = container.add(class);

        FlattenClassExtensions.process(&mut container, id).unwrap();

        let class = container.class(id);
        assert_eq!(names(class), vec!["value", "brand"]);
        assert_eq!(class.attrs[0].types[0].qname, "{urn:a}color");
        assert!(class.extensions.is_empty());
    }
}
