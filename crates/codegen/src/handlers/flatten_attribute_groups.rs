use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{Attr, ClassId};
use crate::utils;
use crate::{CodegenError, Result};
use tracing::trace;

/// Replace group references with the attrs of the referenced group.
///
/// Copied attrs may reference further groups, so the class is scanned until none is left. A
/// group that resolves to the class being flattened is dropped.
#[derive(Debug)]
pub struct FlattenAttributeGroups;

impl ClassHandler for FlattenAttributeGroups {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        while let Some(index) = container.class(target).attrs.iter().position(Attr::is_group) {
            let attr = &container.class(target).attrs[index];
            let tag = attr.tag;
            let qname = attr
                .types
                .first()
                .map(|tp| tp.qname.clone())
                .unwrap_or_else(|| attr.name.clone());

            let source = container
                .find(&qname, |class| class.tag == tag)?
                .ok_or_else(|| CodegenError::MissingGroup(qname.clone()))?;

            if source == target {
                trace!(%qname, "dropping self referencing group");
                container.class_mut(target).attrs.remove(index);
            } else {
                utils::copy_group_attributes(container, source, target, index)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::container::Step;
    use crate::models::{Restrictions, Tag};
    use crate::testing::{AttrFactory, ClassFactory};
    use pretty_assertions::assert_eq;

    fn names(container: &ClassContainer, id: ClassId) -> Vec<&str> {
        container
            .class(id)
            .attrs
            .iter()
            .map(|attr| attr.name.as_str())
            .collect()
    }

    #[test]
    fn test_nested_groups_are_inlined() {
        let mut container = ClassContainer::new(GeneratorConfig::default());

        let mut inner = ClassFactory::elements("{urn:a}inner", &["i1", "i2"]);
        inner.tag = Tag::Group;
        container.add(inner);

        let mut outer = ClassFactory::elements("{urn:a}outer", &["o1"]);
        outer.tag = Tag::Group;
        outer
            .attrs
            .push(AttrFactory::reference(Tag::Group, "inner", "{urn:a}inner"));
        container.add(outer);

        let mut target = ClassFactory::elements("{urn:a}target", &["first"]);
        let mut reference = AttrFactory::reference(Tag::Group, "outer", "{urn:a}outer");
        reference.restrictions = Restrictions::occurs(0, 1);
        target.attrs.push(reference);
        let target = container.add(target);

        container.process_classes(Step::Ungroup).unwrap();

        assert_eq!(names(&container, target), vec!["first", "o1", "i1", "i2"]);
        assert!(container.class(target).attrs[1..]
            .iter()
            .all(|attr| attr.restrictions.min_occurs == Some(0)));
    }

    #[test]
    fn test_attribute_group_lookup_matches_tag() {
        let mut container = ClassContainer::new(GeneratorConfig::default());

        let mut group = ClassFactory::create("{urn:a}common", Tag::AttributeGroup);
        group.attrs.push(AttrFactory::attribute("lang"));
        container.add(group);
        container.add(ClassFactory::elements("{urn:a}common", &["not_a_group"]));

        let mut target = ClassFactory::create("{urn:a}target", Tag::ComplexType);
        target
            .attrs
            .push(AttrFactory::reference(Tag::AttributeGroup, "common", "{urn:a}common"));
        let target = container.add(target);

        container.process_classes(Step::Ungroup).unwrap();
        assert_eq!(names(&container, target), vec!["lang"]);
    }

    #[test]
    fn test_mutual_group_references_terminate() {
        let mut container = ClassContainer::new(GeneratorConfig::default());

        let mut a = ClassFactory::elements("{urn:a}a", &["a1"]);
        a.tag = Tag::Group;
        a.attrs.push(AttrFactory::reference(Tag::Group, "b", "{urn:a}b"));
        let a = container.add(a);

        let mut b = ClassFactory::elements("{urn:a}b", &["b1"]);
        b.tag = Tag::Group;
        b.attrs.push(AttrFactory::reference(Tag::Group, "a", "{urn:a}a"));
        let b = container.add(b);

        container.process_classes(Step::Ungroup).unwrap();

        assert!(!container.class(a).attrs.iter().any(Attr::is_group));
        assert!(!container.class(b).attrs.iter().any(Attr::is_group));
        assert_eq!(names(&container, a), vec!["a1", "b1"]);
    }

    #[test]
    fn test_missing_group_is_fatal() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let mut target = ClassFactory::create("{urn:a}target", Tag::ComplexType);
        target
            .attrs
            .push(AttrFactory::reference(Tag::Group, "nope", "{urn:a}nope"));
        container.add(target);

        let err = container.process_classes(Step::Ungroup).unwrap_err();
        assert_eq!(err.to_string(), "Group attribute not found: `{urn:a}nope`");
    }
}
