use super::{base_attrs, ClassHandler};
use crate::config::CompoundFields;
use crate::container::ClassContainer;
use crate::datatype::DataType;
use crate::models::{add_occurs, Attr, AttrType, ClassId, CompositorKind, GroupId, Restrictions, Tag};
use crate::namespaces;
use crate::text;
use crate::Result;
use itertools::Itertools;
use std::collections::HashSet;

/// Replace the members of each choice with a single compound field.
///
/// With compound fields disabled the members stay separate fields and only become optional.
#[derive(Debug)]
pub struct CreateCompoundFields;

impl ClassHandler for CreateCompoundFields {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let groups = choice_groups(&container.class(target).attrs);
        if groups.is_empty() {
            return Ok(());
        }

        if !container.config().output.compound_fields.enabled {
            let attrs = &mut container.class_mut(target).attrs;
            for index in groups.into_iter().flat_map(|(_, indexes)| indexes) {
                attrs[index].restrictions.min_occurs = Some(0);
            }
            return Ok(());
        }

        for (choice, _) in groups {
            group_fields(container, target, choice)?;
        }
        Ok(())
    }
}

/// Choice ids shared by more than one attr, with their attr indexes, in declaration order.
fn choice_groups(attrs: &[Attr]) -> Vec<(GroupId, Vec<usize>)> {
    let mut groups: Vec<(GroupId, Vec<usize>)> = Vec::new();
    for (index, choice) in attrs
        .iter()
        .enumerate()
        .filter_map(|(index, attr)| attr.restrictions.choice.map(|choice| (index, choice)))
    {
        match groups.iter_mut().find(|(id, _)| *id == choice) {
            Some((_, indexes)) => indexes.push(index),
            None => groups.push((choice, vec![index])),
        }
    }
    groups.retain(|(_, indexes)| indexes.len() > 1);
    groups
}

fn group_fields(container: &mut ClassContainer, target: ClassId, choice: GroupId) -> Result<()> {
    let config = container.config().output.compound_fields.clone();
    let inherited = base_attrs(container, target)?;

    let attrs = &container.class(target).attrs;
    let positions: Vec<usize> = attrs
        .iter()
        .positions(|attr| attr.restrictions.choice == Some(choice))
        .collect();
    let Some(&first) = positions.first() else {
        return Ok(());
    };
    let members: Vec<&Attr> = positions.iter().map(|&index| &attrs[index]).collect();

    let optional = members[0].restrictions.path.iter().any(|entry| {
        entry.kind == CompositorKind::Choice && entry.id == choice && entry.min_occurs == 0
    });
    let min_occurs = if optional {
        0
    } else {
        members
            .iter()
            .map(|attr| attr.restrictions.min_occurs.unwrap_or(1))
            .min()
            .unwrap_or(0)
    };
    let max_occurs = members.iter().fold(0, |total, attr| {
        add_occurs(total, attr.restrictions.max_occurs.unwrap_or(1))
    });

    let names: Vec<String> = members
        .iter()
        .map(|attr| attr.field_name().to_string())
        .collect();
    let substitutions: Vec<String> = members
        .iter()
        .filter_map(|attr| attr.substitution.as_deref())
        .map(|head| namespaces::local_name(head).to_string())
        .collect();
    let choices: Vec<Attr> = members.iter().map(|attr| build_attr_choice(attr)).collect();

    let remaining = attrs
        .iter()
        .enumerate()
        .filter(|(index, _)| !positions.contains(index))
        .map(|(_, attr)| attr);
    let reserved = reserved_names(remaining.chain(&inherited), &names);
    let name = choose_name(&config, names, substitutions, &reserved);

    let mut compound = Attr::new(Tag::Choice, name, AttrType::native(DataType::AnyType));
    compound.index = attrs[first].index;
    compound.choices = choices;
    compound.restrictions = Restrictions::occurs(min_occurs, max_occurs);

    let attrs = &mut container.class_mut(target).attrs;
    for &index in positions.iter().rev() {
        attrs.remove(index);
    }
    attrs.insert(first, compound);
    Ok(())
}

/// The member as it appears inside the compound field, which owns the cardinality.
fn build_attr_choice(attr: &Attr) -> Attr {
    let mut choice = attr.clone();
    choice.choices.clear();
    choice.restrictions.min_occurs = None;
    choice.restrictions.max_occurs = None;
    choice.restrictions.sequential = None;
    choice
}

fn choose_name(
    config: &CompoundFields,
    names: Vec<String>,
    substitutions: Vec<String>,
    reserved: &HashSet<String>,
) -> String {
    let names = if config.use_substitution_groups && substitutions.len() == names.len() {
        substitutions
    } else {
        names
    };
    let names: Vec<String> = names.into_iter().unique().collect();

    let name = if config.force_default_name || names.len() > config.max_name_parts {
        config.default_name.clone()
    } else {
        names.join("_Or_")
    };
    text::unique_name(&name, reserved)
}

/// Slugs already taken, ignoring a compound field built from the same members.
fn reserved_names<'a>(attrs: impl Iterator<Item = &'a Attr>, names: &[String]) -> HashSet<String> {
    let members: Vec<&str> = names.iter().map(String::as_str).sorted().collect();
    attrs
        .filter(|attr| {
            !attr.is_choice()
                || attr
                    .choices
                    .iter()
                    .map(Attr::field_name)
                    .sorted()
                    .collect::<Vec<_>>()
                    != members
        })
        .map(Attr::slug)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::models::{PathEntry, UNBOUNDED};
    use crate::testing::{AttrFactory, ClassFactory};
    use pretty_assertions::assert_eq;

    fn config(enabled: bool, max_name_parts: usize) -> GeneratorConfig {
        let mut config = GeneratorConfig::default();
        config.output.compound_fields.enabled = enabled;
        config.output.compound_fields.max_name_parts = max_name_parts;
        config
    }

    fn member(choice: GroupId) -> Attr {
        let mut attr = AttrFactory::create();
        attr.restrictions.choice = Some(choice);
        attr.restrictions.path = vec![PathEntry::choice(choice, 1, 1)];
        attr
    }

    fn field_names(container: &ClassContainer, id: ClassId) -> Vec<String> {
        container
            .class(id)
            .attrs
            .iter()
            .map(|attr| attr.field_name().to_string())
            .collect()
    }

    #[test]
    fn test_names_join_members_or_fall_back_to_default() {
        let mut container = ClassContainer::new(config(true, 3));
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        class.attrs = (0..4).map(|_| member(1)).chain((0..4).map(|_| member(2))).collect();
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();
        assert_eq!(field_names(&container, id), vec!["choice", "choice_1"]);

        let mut container = ClassContainer::new(config(true, 4));
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        class.attrs = ["attr_B", "attr_C", "attr_D", "attr_E"]
            .iter()
            .map(|name| {
                let mut attr = member(1);
                attr.name = name.to_string();
                attr
            })
            .collect();
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();
        assert_eq!(
            field_names(&container, id),
            vec!["attr_B_Or_attr_C_Or_attr_D_Or_attr_E"]
        );
    }

    #[test]
    fn test_compound_field_owns_cardinality() {
        let mut container = ClassContainer::new(config(true, 3));
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        let mut a = member(7);
        a.name = "a".into();
        a.restrictions.min_occurs = Some(1);
        a.restrictions.max_occurs = Some(1);
        let mut b = member(7);
        b.name = "b".into();
        b.restrictions.min_occurs = Some(2);
        b.restrictions.max_occurs = Some(3);
        class.attrs = vec![AttrFactory::attribute("id"), a, b, AttrFactory::element("tail")];
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(field_names(&container, id), vec!["id", "a_Or_b", "tail"]);
        let compound = &attrs[1];
        assert!(compound.is_choice());
        assert_eq!(compound.restrictions.min_occurs, Some(1));
        assert_eq!(compound.restrictions.max_occurs, Some(4));
        assert_eq!(compound.choices.len(), 2);
        assert!(compound
            .choices
            .iter()
            .all(|choice| choice.restrictions.min_occurs.is_none()
                && choice.restrictions.max_occurs.is_none()));
    }

    #[test]
    fn test_optional_choice_and_unbounded_members() {
        let mut container = ClassContainer::new(config(true, 3));
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        let mut a = member(3);
        a.restrictions.path = vec![PathEntry::choice(3, 0, 1)];
        let mut b = member(3);
        b.restrictions.path = vec![PathEntry::choice(3, 0, 1)];
        b.restrictions.max_occurs = Some(UNBOUNDED);
        class.attrs = vec![a, b];
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();

        let compound = &container.class(id).attrs[0];
        assert_eq!(compound.restrictions.min_occurs, Some(0));
        assert_eq!(compound.restrictions.max_occurs, Some(UNBOUNDED));
    }

    #[test]
    fn test_substitution_heads_name_the_field() {
        let mut config = config(true, 3);
        config.output.compound_fields.use_substitution_groups = true;
        let mut container = ClassContainer::new(config);
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        class.attrs = (0..3)
            .map(|_| {
                let mut attr = member(5);
                attr.substitution = Some("{urn:a}shape".into());
                attr
            })
            .collect();
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();
        assert_eq!(field_names(&container, id), vec!["shape"]);
    }

    #[test]
    fn test_disabled_makes_members_optional() {
        let mut container = ClassContainer::new(config(false, 3));
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        class.attrs = vec![member(1), member(1), AttrFactory::element("single")];
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();

        let attrs = &container.class(id).attrs;
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].restrictions.min_occurs, Some(0));
        assert_eq!(attrs[1].restrictions.min_occurs, Some(0));
        assert_eq!(attrs[2].restrictions.min_occurs, None);
    }

    #[test]
    fn test_rerun_is_stable() {
        let mut container = ClassContainer::new(config(true, 3));
        let mut class = ClassFactory::create("{urn:a}t", Tag::ComplexType);
        class.attrs = vec![member(1), member(1)];
        let id = container.add(class);

        CreateCompoundFields.process(&mut container, id).unwrap();
        let once = container.class(id).attrs.clone();
        CreateCompoundFields.process(&mut container, id).unwrap();

        assert_eq!(container.class(id).attrs, once);
    }
}
