use super::ContainerHandler;
use crate::config::FilterStrategy;
use crate::container::ClassContainer;
use crate::models::ClassId;
use crate::Result;
use std::collections::HashSet;
use tracing::{info, warn};

/// Keep only the classes the configured filter strategy asks for.
#[derive(Debug)]
pub struct FilterClasses;

impl ContainerHandler for FilterClasses {
    fn run(&self, container: &mut ClassContainer) -> Result<()> {
        let strategy = container.config().output.filter_strategy;
        let classes = match strategy {
            FilterStrategy::All => container.ids(),
            FilterStrategy::AllGlobals => filter_all_globals(container),
            FilterStrategy::Referred => filter_referred_classes(container),
        };

        if classes.is_empty() {
            warn!(?strategy, "filter strategy returned no classes, keeping every class");
            return Ok(());
        }

        let total = container.len();
        info!(?strategy, kept = classes.len(), total, "filtered classes");
        container.set(classes);
        Ok(())
    }
}

/// Resolved references of a class and all its inner classes.
fn references(container: &ClassContainer, id: ClassId) -> Vec<ClassId> {
    container
        .walk(id)
        .into_iter()
        .flat_map(|class| container.class(class).references())
        .collect()
}

/// Global types and everything they reach.
fn filter_all_globals(container: &ClassContainer) -> Vec<ClassId> {
    let ids = container.ids();
    let mut occurs: HashSet<ClassId> = HashSet::new();
    let mut stack: Vec<ClassId> = ids
        .iter()
        .copied()
        .filter(|id| container.class(*id).is_global_type())
        .collect();

    while let Some(id) = stack.pop() {
        if occurs.insert(id) {
            stack.extend(references(container, id));
        }
    }

    ids.into_iter().filter(|id| occurs.contains(id)).collect()
}

/// Classes some other class points at.
fn filter_referred_classes(container: &ClassContainer) -> Vec<ClassId> {
    let ids = container.ids();
    let referred: HashSet<ClassId> = ids
        .iter()
        .flat_map(|id| {
            references(container, *id)
                .into_iter()
                .filter(move |reference| reference != id)
        })
        .collect();

    ids.into_iter().filter(|id| referred.contains(id)).collect()
}
