use super::ContainerHandler;
use crate::container::ClassContainer;
use crate::models::{Class, ClassId};
use crate::namespaces;
use crate::text;
use crate::Result;
use std::collections::{BTreeMap, HashSet};
use tracing::info;

/// Give every registered class a name no other class collides with.
///
/// Classes are compared by qualified name, or by local name when every class ends up in the
/// same namespace or the structure style mixes namespaces in one module. A lone element among
/// the colliding classes keeps its name; the rest get the first free `_N` suffix.
#[derive(Debug)]
pub struct RenameDuplicateClasses;

impl ContainerHandler for RenameDuplicateClasses {
    fn run(&self, container: &mut ClassContainer) -> Result<()> {
        let renames = self.rename(container);
        if !renames.is_empty() {
            info!(renamed = renames.len(), "renamed duplicate classes");
        }
        Ok(())
    }
}

impl RenameDuplicateClasses {
    /// Rename the colliding classes and return the new qname of every renamed class.
    pub fn rename(&self, container: &mut ClassContainer) -> BTreeMap<ClassId, String> {
        let use_names = should_use_names(container);

        let mut groups: Vec<(String, Vec<ClassId>)> = Vec::new();
        for id in container.ids() {
            let key = text::alnum(compared_name(container.class(id), use_names));
            match groups.iter_mut().find(|(existing, _)| *existing == key) {
                Some((_, ids)) => ids.push(id),
                None => groups.push((key, vec![id])),
            }
        }

        let mut renames = BTreeMap::new();
        for (_, mut ids) in groups.into_iter().filter(|(_, ids)| ids.len() > 1) {
            let elements = ids.iter().filter(|id| container.class(**id).is_element()).count();
            ids.sort_by_key(|id| container.class(*id).tag.as_str());

            for id in ids {
                if container.class(id).is_element() && elements == 1 {
                    continue;
                }
                let qname = rename_class(container, id, use_names);
                renames.insert(id, qname);
            }
        }

        if !renames.is_empty() {
            update_references(container, &renames);
        }
        renames
    }
}

fn should_use_names(container: &ClassContainer) -> bool {
    if container.config().output.structure_style.requires_unique_names() {
        return true;
    }
    let namespaces: HashSet<Option<&str>> = container
        .classes()
        .map(Class::target_namespace)
        .collect();
    namespaces.len() == 1
}

fn compared_name(class: &Class, use_names: bool) -> &str {
    if use_names {
        class.name()
    } else {
        &class.qname
    }
}

fn rename_class(container: &mut ClassContainer, id: ClassId, use_names: bool) -> String {
    let reserved: HashSet<String> = container
        .classes()
        .map(|class| text::alnum(compared_name(class, use_names)))
        .collect();

    let class = container.class(id);
    let previous = class.qname.clone();
    let namespace = class.target_namespace().map(str::to_string);
    let name = class.name().to_string();

    let mut index = 1;
    let qname = loop {
        let candidate_name = format!("{name}_{index}");
        let candidate = namespaces::build_qname(namespace.as_deref(), &candidate_name);
        let compared = if use_names { &candidate_name } else { &candidate };
        if !reserved.contains(&text::alnum(compared)) {
            break candidate;
        }
        index += 1;
    };

    let class = container.class_mut(id);
    class.meta_name.get_or_insert(name);
    class.qname.clone_from(&qname);
    container.reset(id, &previous);
    qname
}

fn update_references(container: &mut ClassContainer, renames: &BTreeMap<ClassId, String>) {
    for id in container.all_ids() {
        for attr_type in container.class_mut(id).types_mut() {
            if let Some(qname) = attr_type.reference.and_then(|reference| renames.get(&reference)) {
                attr_type.qname.clone_from(qname);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeneratorConfig, StructureStyle};
    use crate::datatype::DataType;
    use crate::models::{Attr, AttrType, Tag};
    use crate::testing::{AttrFactory, ClassFactory};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_case_insensitive_duplicates_are_numbered() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let first = container.add(ClassFactory::create("{foo}A", Tag::ComplexType));
        let second = container.add(ClassFactory::create("{foo}a", Tag::ComplexType));
        let other = container.add(ClassFactory::create("{foo}B", Tag::ComplexType));

        let renames = RenameDuplicateClasses.rename(&mut container);

        assert_eq!(
            renames,
            BTreeMap::from([(first, "{foo}A_1".to_string()), (second, "{foo}a_2".to_string())])
        );
        assert_eq!(container.class(other).qname, "{foo}B");
        assert_eq!(container.class(first).meta_name.as_deref(), Some("A"));
        assert_eq!(container.first("{foo}a_2"), Some(second));
        assert_eq!(container.first("{foo}A"), None);
    }

    #[test]
    fn test_lone_element_keeps_its_name() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let complex = container.add(ClassFactory::create("{foo}item", Tag::ComplexType));
        let element = container.add(ClassFactory::create("{foo}item", Tag::Element));
        let simple = container.add(ClassFactory::create("{foo}item", Tag::SimpleType));

        let mut attr = AttrFactory::reference(Tag::Element, "item", "{foo}item");
        attr.types[0].reference = Some(complex);
        container.class_mut(element).attrs.push(attr);

        let renames = RenameDuplicateClasses.rename(&mut container);

        assert_eq!(renames.len(), 2);
        assert_eq!(container.class(element).qname, "{foo}item");
        assert_eq!(container.class(complex).qname, "{foo}item_1");
        assert_eq!(container.class(simple).qname, "{foo}item_2");
        assert_eq!(container.class(element).attrs[0].types[0].qname, "{foo}item_1");
    }

    #[test]
    fn test_names_across_namespaces_when_required() {
        let mut config = GeneratorConfig::default();
        config.output.structure_style = StructureStyle::SinglePackage;
        let mut container = ClassContainer::new(config);
        let a = container.add(ClassFactory::create("{urn:a}shape", Tag::ComplexType));
        let b = container.add(ClassFactory::create("{urn:b}Shape", Tag::ComplexType));

        let renames = RenameDuplicateClasses.rename(&mut container);

        assert_eq!(renames.len(), 2);
        assert_eq!(container.class(a).qname, "{urn:a}shape_1");
        assert_eq!(container.class(b).qname, "{urn:b}Shape_2");
    }

    #[test]
    fn test_different_namespaces_do_not_collide_by_default() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        container.add(ClassFactory::create("{urn:a}shape", Tag::ComplexType));
        container.add(ClassFactory::create("{urn:b}shape", Tag::ComplexType));

        assert!(RenameDuplicateClasses.rename(&mut container).is_empty());
    }

    #[test]
    fn test_rerun_renames_nothing() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        container.add(ClassFactory::create("{foo}A", Tag::ComplexType));
        container.add(ClassFactory::create("{foo}a", Tag::ComplexType));
        let mut holder = ClassFactory::create("{foo}holder", Tag::Element);
        holder.attrs.push(Attr::new(Tag::Element, "x", AttrType::native(DataType::Int)));
        container.add(holder);

        RenameDuplicateClasses.rename(&mut container);
        assert!(RenameDuplicateClasses.rename(&mut container).is_empty());
    }
}
