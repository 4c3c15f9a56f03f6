use super::ClassHandler;
use crate::container::ClassContainer;
use crate::datatype::DataType;
use crate::models::{Attr, AttrType, ClassId, Restrictions, Tag, SUFFIX_INDEX, UNBOUNDED};
use crate::namespaces::ANY_NAMESPACE;
use crate::Result;

/// Give mixed content classes a wildcard for the interleaved text and elements.
#[derive(Debug)]
pub struct ProcessMixedContentClass;

impl ClassHandler for ProcessMixedContentClass {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let class = container.class_mut(target);
        if !class.is_mixed() {
            return Ok(());
        }

        if let Some(wildcard) = class.attrs.iter_mut().find(|attr| attr.tag == Tag::Any) {
            wildcard.mixed = true;
            wildcard.restrictions.min_occurs = Some(0);
            if !wildcard.is_list() {
                wildcard.restrictions.max_occurs = Some(UNBOUNDED);
            }
            return Ok(());
        }

        let mut content = Attr::new(Tag::Any, "content", AttrType::native(DataType::AnyType));
        content.index = SUFFIX_INDEX;
        content.mixed = true;
        content.namespace = Some(ANY_NAMESPACE.to_string());
        content.restrictions = Restrictions::occurs(0, UNBOUNDED);
        class.attrs.push(content);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::testing::{AttrFactory, ClassFactory};

    #[test]
    fn test_mixed_class_gets_content_wildcard() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let mut class = ClassFactory::elements("{urn:a}para", &["b", "i"]);
        class.mixed = true;
        let id = container.add(class);

        ProcessMixedContentClass.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs.len(), 3);
        let content = &attrs[2];
        assert_eq!(content.name, "content");
        assert!(content.mixed && content.is_wildcard() && content.is_suffix());
        assert_eq!(content.restrictions.max_occurs, Some(UNBOUNDED));
    }

    #[test]
    fn test_existing_wildcard_is_reused() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let mut class = ClassFactory::elements("{urn:a}para", &["b"]);
        class.mixed = true;
        class.attrs.push(AttrFactory::any());
        let id = container.add(class);

        ProcessMixedContentClass.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs.len(), 2);
        assert!(attrs[1].mixed);
        assert_eq!(attrs[1].restrictions.min_occurs, Some(0));
        assert_eq!(attrs[1].restrictions.max_occurs, Some(UNBOUNDED));
    }

    #[test]
    fn test_element_only_class_is_untouched() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let id = container.add(ClassFactory::elements("{urn:a}para", &["b"]));

        ProcessMixedContentClass.process(&mut container, id).unwrap();
        assert_eq!(container.class(id).attrs.len(), 1);
    }
}
