use super::ClassHandler;
use crate::container::ClassContainer;
use crate::datatype::{DataType, NativeKind};
use crate::models::{
    add_occurs, Attr, AttrType, Class, ClassId, Extension, Restrictions, Status, Tag,
};
use crate::namespaces::{self, ANY_NAMESPACE};
use crate::text;
use crate::Result;
use itertools::Itertools;
use std::collections::{HashMap, HashSet};

/// Make the members of every compound field distinguishable by type.
///
/// Wildcard members collapse into one `content` wildcard. Members whose types would render to
/// the same runtime type get a dedicated wrapper class each.
#[derive(Debug)]
pub struct DisambiguateChoices;

impl ClassHandler for DisambiguateChoices {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        for index in 0..container.class(target).attrs.len() {
            if !container.class(target).attrs[index].is_choice() {
                continue;
            }

            let mut attr = container.class(target).attrs[index].clone();
            merge_wildcards(&mut attr);
            for choice in ambiguous_choices(&attr) {
                disambiguate_choice(container, target, &mut attr.choices[choice]);
            }
            container.class_mut(target).attrs[index] = attr;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum TypeKey {
    Native(NativeKind),
    Class(String),
}

impl TypeKey {
    fn of(attr_type: &AttrType) -> Self {
        match attr_type.datatype() {
            Some(datatype) => TypeKey::Native(datatype.kind()),
            None => TypeKey::Class(attr_type.qname.clone()),
        }
    }
}

fn merge_wildcards(attr: &mut Attr) {
    if attr.choices.iter().filter(|choice| choice.is_wildcard()).count() < 2 {
        return;
    }

    let (wildcards, mut choices): (Vec<Attr>, Vec<Attr>) =
        std::mem::take(&mut attr.choices).into_iter().partition(Attr::is_wildcard);

    let namespace = wildcards
        .iter()
        .filter_map(|wildcard| wildcard.namespace.as_deref())
        .flat_map(str::split_whitespace)
        .unique()
        .join(" ");
    let min_occurs: usize = wildcards
        .iter()
        .map(|wildcard| wildcard.restrictions.min_occurs.unwrap_or(0))
        .sum();
    let max_occurs = wildcards.iter().fold(0, |total, wildcard| {
        add_occurs(total, wildcard.restrictions.max_occurs.unwrap_or(1))
    });

    let mut content = Attr::new(Tag::Any, "content", AttrType::native(DataType::AnyType));
    content.namespace = (!namespace.is_empty()).then_some(namespace);
    content.restrictions = Restrictions::occurs(min_occurs, max_occurs);

    choices.push(content);
    attr.choices = choices;
}

/// Indexes of the members that can't be told apart by their types.
fn ambiguous_choices(attr: &Attr) -> Vec<usize> {
    let counts: HashMap<TypeKey, usize> = attr
        .choices
        .iter()
        .filter(|choice| !choice.is_wildcard())
        .flat_map(|choice| choice.types.iter().map(TypeKey::of))
        .counts();

    attr.choices
        .iter()
        .positions(|choice| {
            !choice.is_wildcard()
                && (choice.is_any_type()
                    || choice
                        .types
                        .iter()
                        .any(|tp| counts.get(&TypeKey::of(tp)).is_some_and(|count| *count > 1)))
        })
        .collect()
}

fn disambiguate_choice(container: &mut ClassContainer, target: ClassId, choice: &mut Attr) {
    let inner = !container.config().output.unnest_classes && !choice.is_circular_ref();
    let outer = container.class(target);
    let namespace = choice
        .namespace
        .as_deref()
        .filter(|ns| !ns.is_empty())
        .or(outer.target_namespace())
        .map(str::to_string);

    let name = if inner {
        let reserved: HashSet<String> = outer
            .inner
            .iter()
            .map(|id| text::alnum(container.class(*id).name()))
            .collect();
        text::unique_name(choice.field_name(), &reserved)
    } else {
        let reserved: HashSet<String> = container
            .classes()
            .map(|class| text::alnum(class.name()))
            .collect();
        text::unique_name(&format!("{}_{}", outer.name(), choice.field_name()), &reserved)
    };
    let qname = namespaces::build_qname(namespace.as_deref(), &name);

    let mut class = Class::new(qname.clone(), Tag::Element, outer.location.clone());
    class.status = Status::Processed;
    class.namespace = choice.namespace.clone();
    class.nillable = choice.is_nillable();

    if choice.is_any_type() {
        let mut content = Attr::new(Tag::Any, "content", AttrType::native(DataType::AnyType));
        content.namespace = Some(ANY_NAMESPACE.to_string());
        class.attrs.push(content);
    } else if choice.types.iter().all(|tp| tp.native) {
        let mut value = Attr::untyped(Tag::Extension, "value");
        value.types = choice.types.clone();
        value.restrictions = Restrictions {
            path: Vec::new(),
            choice: None,
            sequence: None,
            sequential: None,
            group: None,
            ..choice.restrictions.clone()
        };
        value.restrictions.reset_occurrences();
        class.attrs.push(value);
    } else if let Some(base) = choice.types.first() {
        class.extensions.push(Extension::new(Tag::Extension, base.clone()));
    }

    let (id, mut attr_type) = if inner {
        class.local_type = true;
        (container.add_inner(target, class), AttrType::forward(qname))
    } else {
        (container.add(class), AttrType::new(qname))
    };
    attr_type.reference = Some(id);
    choice.types = vec![attr_type];
}
