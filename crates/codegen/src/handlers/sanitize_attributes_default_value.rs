use super::ClassHandler;
use crate::container::ClassContainer;
use crate::datatype::{DataType, NativeKind};
use crate::models::{Attr, AttrType, Class, ClassId, XmlType};
use crate::Result;
use tracing::warn;

/// Make attr defaults agree with their types and cardinality.
///
/// Defaults are dropped on lists and optional elements, matched against the native types,
/// rewritten to `@enum@{qname}::{member}` references for enumeration types, or the attr is
/// widened to `xs:string` when nothing accepts the value.
#[derive(Debug)]
pub struct SanitizeAttributesDefaultValue;

impl ClassHandler for SanitizeAttributesDefaultValue {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let mut attrs = container.class(target).attrs.clone();
        for attr in &mut attrs {
            process_attribute(container, target, attr)?;
            for choice in &mut attr.choices {
                process_attribute(container, target, choice)?;
            }
        }
        container.class_mut(target).attrs = attrs;
        Ok(())
    }
}

fn process_attribute(container: &mut ClassContainer, target: ClassId, attr: &mut Attr) -> Result<()> {
    if should_reset_required(attr) {
        attr.restrictions.min_occurs = Some(0);
    }

    if should_reset_default(attr) {
        attr.default = None;
        attr.fixed = false;
    }

    if attr.default.is_some() {
        process_types(container, target, attr)?;
    } else if attr.xml_type() == XmlType::Text
        && !attr.is_optional()
        && attr.native_types().any(|datatype| datatype.kind() == NativeKind::Str)
    {
        attr.default = Some(String::new());
    }
    Ok(())
}

/// Wildcard typed elements without a default can't be required, there is nothing to fill in.
fn should_reset_required(attr: &Attr) -> bool {
    !attr.is_attribute()
        && attr.default.is_none()
        && attr.native_types().any(|datatype| datatype.kind() == NativeKind::Any)
        && !attr.is_list()
}

fn should_reset_default(attr: &Attr) -> bool {
    attr.default.is_some() && (attr.is_list() || (!attr.is_attribute() && attr.is_optional()))
}

fn process_types(container: &mut ClassContainer, target: ClassId, attr: &mut Attr) -> Result<()> {
    let Some(default) = attr.default.clone() else {
        return Ok(());
    };

    if attr.native_types().any(|datatype| datatype.accepts(&default)) {
        return Ok(());
    }

    let mut has_enumeration = false;
    for attr_type in attr.types.iter().filter(|tp| !tp.native) {
        let Some(source) = find_type(container, target, attr_type)? else {
            continue;
        };
        let source = container.class(source);
        if !source.is_enumeration() {
            continue;
        }

        has_enumeration = true;
        if let Some(value) = enumeration_value(source, &default, attr.restrictions.is_tokens()) {
            attr.default = Some(value);
            return Ok(());
        }
    }

    let class = &container.class(target).qname;
    if has_enumeration {
        warn!(
            class = %class,
            attr = %attr.name,
            default = %default,
            "default value does not match any enumeration member"
        );
        attr.default = None;
        attr.fixed = false;
    } else {
        warn!(
            class = %class,
            attr = %attr.name,
            default = %default,
            "default value does not match the attribute types, widening to xs:string"
        );
        attr.types = vec![AttrType::native(DataType::String)];
        attr.restrictions.format = None;
    }
    Ok(())
}

fn find_type(
    container: &mut ClassContainer,
    target: ClassId,
    attr_type: &AttrType,
) -> Result<Option<ClassId>> {
    if let Some(reference) = attr_type.reference {
        return Ok(Some(reference));
    }
    if attr_type.forward {
        return container.find_inner(target, &attr_type.qname).map(Some);
    }
    container.find(&attr_type.qname, Class::is_enumeration)
}

/// Member reference for `default`, one per token for token lists.
fn enumeration_value(source: &Class, default: &str, tokens: bool) -> Option<String> {
    let member = |value: &str| {
        source
            .attrs
            .iter()
            .find(|attr| attr.default.as_deref().map(str::trim) == Some(value))
            .map(|attr| format!("@enum@{}::{}", source.qname, attr.field_name()))
    };

    if tokens {
        let values: Option<Vec<String>> = default.split_whitespace().map(member).collect();
        values.filter(|values| !values.is_empty()).map(|values| values.join(" "))
    } else {
        member(default.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::models::{Restrictions, Tag, UNBOUNDED};
    use crate::testing::{AttrFactory, ClassFactory};

    fn container_with(attrs: Vec<Attr>) -> (ClassContainer, ClassId) {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        class.attrs = attrs;
        let id = container.add(class);
        (container, id)
    }

    #[test]
    fn test_optional_elements_and_lists_drop_defaults() {
        let mut optional = AttrFactory::element("opt");
        optional.restrictions.min_occurs = Some(0);
        optional.default = Some("x".into());
        optional.fixed = true;
        let mut list = AttrFactory::attribute("list");
        list.restrictions = Restrictions::occurs(1, UNBOUNDED);
        list.default = Some("y".into());
        let mut attribute = AttrFactory::attribute("lang");
        attribute.restrictions.min_occurs = Some(0);
        attribute.default = Some("en".into());
        let (mut container, id) = container_with(vec![optional, list, attribute]);

        SanitizeAttributesDefaultValue.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs[0].default, None);
        assert!(!attrs[0].fixed);
        assert_eq!(attrs[1].default, None);
        assert_eq!(attrs[2].default.as_deref(), Some("en"));
    }

    #[test]
    fn test_invalid_native_default_widens_to_string() {
        let mut attr = AttrFactory::native(Tag::Attribute, "size", DataType::Base64Binary);
        attr.default = Some("not base64!".into());
        attr.restrictions.format = Some("base64".into());
        let mut valid = AttrFactory::native(Tag::Attribute, "count", DataType::Int);
        valid.default = Some("42".into());
        let (mut container, id) = container_with(vec![attr, valid]);

        SanitizeAttributesDefaultValue.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs[0].types, vec![AttrType::native(DataType::String)]);
        assert_eq!(attrs[0].restrictions.format, None);
        assert_eq!(attrs[0].default.as_deref(), Some("not base64!"));
        assert_eq!(attrs[1].types, vec![AttrType::native(DataType::Int)]);
    }

    #[test]
    fn test_enumeration_defaults_reference_members() {
        let mut attr = AttrFactory::reference(Tag::Attribute, "color", "{urn:a}color");
        attr.default = Some(" green ".into());
        let mut unknown = AttrFactory::reference(Tag::Attribute, "shade", "{urn:a}color");
        unknown.default = Some("purple".into());
        unknown.fixed = true;
        let (mut container, id) = container_with(vec![attr, unknown]);
        container.add(ClassFactory::enumeration("{urn:a}color", &["red", "green"]));

        SanitizeAttributesDefaultValue.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs[0].default.as_deref(), Some("@enum@{urn:a}color::green"));
        assert_eq!(attrs[1].default, None);
        assert!(!attrs[1].fixed);
        assert_eq!(attrs[1].types[0].qname, "{urn:a}color");
    }

    #[test]
    fn test_token_list_defaults_reference_every_member() {
        let mut attr = AttrFactory::reference(Tag::Attribute, "colors", "{urn:a}color");
        attr.restrictions.tokens = Some(true);
        attr.default = Some("red green".into());
        let (mut container, id) = container_with(vec![attr]);
        container.add(ClassFactory::enumeration("{urn:a}color", &["red", "green"]));

        SanitizeAttributesDefaultValue.process(&mut container, id).unwrap();

        assert_eq!(
            container.class(id).attrs[0].default.as_deref(),
            Some("@enum@{urn:a}color::red @enum@{urn:a}color::green")
        );
    }

    #[test]
    fn test_required_text_and_wildcard_elements() {
        let text = AttrFactory::native(Tag::Extension, "value", DataType::Token);
        let any = AttrFactory::native(Tag::Element, "payload", DataType::AnyType);
        let (mut container, id) = container_with(vec![text, any]);

        SanitizeAttributesDefaultValue.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs[0].default.as_deref(), Some(""));
        assert_eq!(attrs[1].restrictions.min_occurs, Some(0));
        assert_eq!(attrs[1].default, None);
    }
}
