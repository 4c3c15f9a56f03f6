use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{Attr, ClassId, Tag};
use crate::utils;
use crate::Result;
use std::collections::HashSet;

/// Keep enumeration classes pure.
///
/// A class with enumeration members drops every other attr, and a union of enumerations turns
/// into one enumeration holding all the members. Members are unique by value.
#[derive(Debug)]
pub struct SanitizeEnumerationClass;

impl ClassHandler for SanitizeEnumerationClass {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let class = container.class_mut(target);
        if class.attrs.iter().any(Attr::is_enumeration) {
            class.attrs.retain(Attr::is_enumeration);
            dedupe_members(&mut class.attrs);
            return Ok(());
        }

        if let Some(members) = union_members(container, target)? {
            let class = container.class_mut(target);
            class.attrs = members;
            dedupe_members(&mut class.attrs);
            utils::clean_inner_classes(container, target);
        }
        Ok(())
    }
}

/// Members of every type of a union, if they are all enumerations.
fn union_members(container: &mut ClassContainer, target: ClassId) -> Result<Option<Vec<Attr>>> {
    let class = container.class(target);
    let [attr] = class.attrs.as_slice() else {
        return Ok(None);
    };
    if attr.tag != Tag::Union || attr.types.is_empty() || attr.types.iter().any(|tp| tp.native) {
        return Ok(None);
    }

    let mut members = Vec::new();
    for attr_type in attr.types.clone() {
        let source = if attr_type.forward {
            Some(container.find_inner(target, &attr_type.qname)?)
        } else {
            container.find(&attr_type.qname, |class| class.is_enumeration())?
        };

        match source {
            Some(source) if container.class(source).is_enumeration() => {
                members.extend(container.class(source).attrs.iter().cloned());
            }
            _ => return Ok(None),
        }
    }

    Ok(Some(members))
}

fn dedupe_members(attrs: &mut Vec<Attr>) {
    let mut seen = HashSet::new();
    attrs.retain(|attr| seen.insert(attr.default.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::models::AttrType;
    use crate::testing::{AttrFactory, ClassFactory};
    use pretty_assertions::assert_eq;

    fn defaults(container: &ClassContainer, id: ClassId) -> Vec<&str> {
        container
            .class(id)
            .attrs
            .iter()
            .filter_map(|attr| attr.default.as_deref())
            .collect()
    }

    #[test]
    fn test_enumeration_drops_other_attrs_and_duplicates() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let mut class = ClassFactory::enumeration("{urn:a}size", &["S", "M", "S"]);
        class.attrs.push(AttrFactory::element("noise"));
        let id = container.add(class);

        SanitizeEnumerationClass.process(&mut container, id).unwrap();

        assert_eq!(defaults(&container, id), vec!["S", "M"]);
        assert_eq!(container.class(id).attrs.len(), 2);
    }

    #[test]
    fn test_union_of_enumerations_is_merged() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        container.add(ClassFactory::enumeration("{urn:a}small", &["XS", "S"]));

        let mut class = ClassFactory::create("{urn:a}size", Tag::SimpleType);
        let mut union = Attr::untyped(Tag::Union, "value");
        union.types = vec![
            AttrType::new("{urn:a}small"),
            AttrType::forward("{urn:a}large"),
        ];
        class.attrs.push(union);
        let id = container.add(class);
        container.add_inner(id, ClassFactory::enumeration("{urn:a}large", &["L", "S"]));

        SanitizeEnumerationClass.process(&mut container, id).unwrap();

        assert_eq!(defaults(&container, id), vec!["XS", "S", "L"]);
        assert!(container.class(id).is_enumeration());
        assert!(container.class(id).inner.is_empty());
    }

    #[test]
    fn test_union_with_native_member_is_untouched() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        container.add(ClassFactory::enumeration("{urn:a}small", &["S"]));

        let mut class = ClassFactory::create("{urn:a}size", Tag::SimpleType);
        let mut union = Attr::untyped(Tag::Union, "value");
        union.types = vec![
            AttrType::new("{urn:a}small"),
            AttrType::native(crate::datatype::DataType::Int),
        ];
        class.attrs.push(union);
        let id = container.add(class);

        SanitizeEnumerationClass.process(&mut container, id).unwrap();

        assert_eq!(container.class(id).attrs.len(), 1);
        assert_eq!(container.class(id).attrs[0].tag, Tag::Union);
    }
}
