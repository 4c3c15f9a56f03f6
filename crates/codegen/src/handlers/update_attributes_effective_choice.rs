use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{add_occurs, Attr, ClassId, GroupId, PathEntry, Tag};
use crate::Result;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// Detect elements that repeat out of order inside the same compositor.
///
/// `<a/><b/><a/>` makes `a` and `b` an effective choice: every attr between the first and last
/// occurrence of a repeated element is tagged with a synthetic negative choice id and the
/// repetitions are merged by summing their bounds. Repetitions only count when the tag,
/// namespace, name, declared choice and compositor path all match.
#[derive(Debug)]
pub struct UpdateAttributesEffectiveChoice;

type MergeKey = (Tag, Option<String>, String, Option<GroupId>, Vec<PathEntry>);

fn merge_key(attr: &Attr) -> MergeKey {
    (
        attr.tag,
        attr.namespace.clone(),
        attr.name.clone(),
        attr.restrictions.choice,
        attr.restrictions.path.clone(),
    )
}

impl ClassHandler for UpdateAttributesEffectiveChoice {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let class = container.class_mut(target);
        if class.is_enumeration() {
            return Ok(());
        }

        let groups = group_repeating_attrs(&class.attrs);
        if groups.is_empty() {
            return Ok(());
        }

        class.attrs = merge_attrs(std::mem::take(&mut class.attrs), &groups);
        Ok(())
    }
}

/// Connected index ranges spanning each repeated element.
fn group_repeating_attrs(attrs: &[Attr]) -> Vec<RangeInclusive<usize>> {
    let mut counters: HashMap<MergeKey, Vec<usize>> = HashMap::new();
    for (index, attr) in attrs.iter().enumerate() {
        if !attr.is_attribute() {
            counters.entry(merge_key(attr)).or_default().push(index);
        }
    }

    let mut ranges: Vec<RangeInclusive<usize>> = counters
        .values()
        .filter(|indexes| indexes.len() > 1)
        .map(|indexes| indexes[0]..=indexes[indexes.len() - 1])
        .collect();
    ranges.sort_by_key(|range| *range.start());

    let mut components: Vec<RangeInclusive<usize>> = Vec::new();
    for range in ranges {
        match components.last_mut() {
            Some(last) if range.start() <= last.end() => {
                let end = (*last.end()).max(*range.end());
                *last = *last.start()..=end;
            }
            _ => components.push(range),
        }
    }
    components
}

fn merge_attrs(attrs: Vec<Attr>, groups: &[RangeInclusive<usize>]) -> Vec<Attr> {
    let mut result: Vec<Attr> = Vec::with_capacity(attrs.len());
    // Per result slot: the group and merge key it was admitted with, and its declared choice.
    let mut slots: Vec<Option<(usize, MergeKey)>> = Vec::with_capacity(attrs.len());
    let mut declared: Vec<Option<GroupId>> = Vec::with_capacity(attrs.len());

    for (index, mut attr) in attrs.into_iter().enumerate() {
        let group = if attr.is_attribute() {
            None
        } else {
            groups.iter().position(|range| range.contains(&index))
        };
        let Some(group) = group else {
            declared.push(attr.restrictions.choice);
            slots.push(None);
            result.push(attr);
            continue;
        };

        let slot = Some((group, merge_key(&attr)));
        match slots.iter().position(|existing| *existing == slot) {
            Some(pos) => {
                let existing = &mut result[pos].restrictions;
                existing.min_occurs = Some(add_occurs(
                    existing.min_occurs.unwrap_or(1),
                    attr.restrictions.min_occurs.unwrap_or(1),
                ));
                existing.max_occurs = Some(add_occurs(
                    existing.max_occurs.unwrap_or(1),
                    attr.restrictions.max_occurs.unwrap_or(1),
                ));
            }
            None => {
                declared.push(attr.restrictions.choice);
                attr.restrictions.choice = Some(-(group as GroupId) - 1);
                slots.push(slot);
                result.push(attr);
            }
        }
    }

    // A group that collapsed into a single attr is no choice at all.
    for group in 0..groups.len() {
        let choice = Some(-(group as GroupId) - 1);
        let members: Vec<usize> = result
            .iter()
            .enumerate()
            .filter(|(_, attr)| attr.restrictions.choice == choice)
            .map(|(index, _)| index)
            .collect();
        if let &[single] = members.as_slice() {
            result[single].restrictions.choice = declared[single];
        }
    }

    result
}
