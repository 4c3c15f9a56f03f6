use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{Attr, ClassId};
use crate::text;
use crate::Result;
use std::collections::HashSet;

/// Give every attr of a class a unique field name.
///
/// Two clashing attrs of different kinds keep the first name and suffix the second with its tag,
/// e.g. `id` and `id_Element`. Any other clash keeps the first and numbers the rest.
#[derive(Debug)]
pub struct RenameDuplicateAttributes;

impl ClassHandler for RenameDuplicateAttributes {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        rename_attrs(&mut container.class_mut(target).attrs);
        Ok(())
    }
}

pub(crate) fn rename_attrs(attrs: &mut [Attr]) {
    let mut reserved: HashSet<String> = attrs.iter().map(Attr::slug).collect();

    let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
    for (index, attr) in attrs.iter().enumerate() {
        let slug = attr.slug();
        match groups.iter_mut().find(|(existing, _)| *existing == slug) {
            Some((_, indexes)) => indexes.push(index),
            None => groups.push((slug, vec![index])),
        }
    }

    for (_, indexes) in groups.into_iter().filter(|(_, indexes)| indexes.len() > 1) {
        if let &[first, second] = indexes.as_slice() {
            if attrs[first].tag != attrs[second].tag
                && !attrs[first].is_enumeration()
                && !attrs[second].is_enumeration()
            {
                rename_by_tag(&mut attrs[second], &mut reserved);
                continue;
            }
        }

        for &index in &indexes[1..] {
            rename_numbered(&mut attrs[index], &mut reserved);
        }
    }
}

fn rename_by_tag(attr: &mut Attr, reserved: &mut HashSet<String>) {
    let name = format!("{}_{}", attr.field_name(), attr.tag);
    if reserved.insert(text::alnum(&name)) {
        attr.rename(name);
    } else {
        rename_numbered(attr, reserved);
    }
}

fn rename_numbered(attr: &mut Attr, reserved: &mut HashSet<String>) {
    let name = text::unique_name(attr.field_name(), reserved);
    reserved.insert(text::alnum(&name));
    attr.rename(name);
}
