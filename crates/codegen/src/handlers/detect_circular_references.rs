use super::ClassHandler;
use crate::container::ClassContainer;
use crate::models::{Class, ClassId};
use crate::Result;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

/// Mark every resolved reference that leads back to its own class.
///
/// References already marked circular are not followed, so each cycle ends up broken by the
/// first reference found on it and a second run gives the same flags.
#[derive(Debug, Default)]
pub struct DetectCircularReferences {
    /// Built from the whole container on first use.
    graph: RefCell<Option<ReferenceGraph>>,
}

impl ClassHandler for DetectCircularReferences {
    fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
        let mut graph = self.graph.borrow_mut();
        let graph = graph.get_or_insert_with(|| ReferenceGraph::build(container));

        // Later handlers move references of already checked classes into new inner classes.
        let mut current = Some(target);
        while let Some(id) = current {
            graph.refresh(container, id);
            current = container.class(id).parent;
        }

        let count = container.class(target).types().count();
        for index in 0..count {
            let Some(attr_type) = container.class(target).types().nth(index) else {
                break;
            };
            if attr_type.native || attr_type.forward {
                continue;
            }
            let Some(reference) = attr_type.reference else {
                continue;
            };
            let previous = attr_type.circular;

            let circular = graph.is_circular(container, reference, target);
            if let Some(attr_type) = container.class_mut(target).types_mut().nth(index) {
                attr_type.circular = circular;
            }
            if circular != previous {
                graph.refresh(container, target);
            }
        }
        Ok(())
    }
}

/// Followable references of every class, inner classes excluded.
#[derive(Debug, Default)]
struct ReferenceGraph {
    edges: HashMap<ClassId, Vec<ClassId>>,
}

impl ReferenceGraph {
    fn build(container: &ClassContainer) -> Self {
        let edges = container
            .all_ids()
            .into_iter()
            .map(|id| (id, followable(container.class(id))))
            .collect();
        Self { edges }
    }

    /// Re-read the references of one class.
    fn refresh(&mut self, container: &ClassContainer, id: ClassId) {
        self.edges.insert(id, followable(container.class(id)));
    }

    /// Whether `stop` is reachable from `start` through references not marked circular.
    ///
    /// Classes created after the graph was built are read on first visit.
    fn is_circular(
        &mut self,
        container: &ClassContainer,
        start: ClassId,
        stop: ClassId,
    ) -> bool {
        let mut path = HashSet::new();
        let mut queue = VecDeque::from([start]);

        while let Some(current) = queue.pop_front() {
            if current == stop {
                return true;
            }
            if !path.insert(current) {
                continue;
            }

            for id in container.walk(current) {
                let edges = self
                    .edges
                    .entry(id)
                    .or_insert_with(|| followable(container.class(id)));
                queue.extend(edges.iter().filter(|reference| !path.contains(*reference)));
            }
        }
        false
    }
}

fn followable(class: &Class) -> Vec<ClassId> {
    class
        .types()
        .filter(|attr_type| !attr_type.native && !attr_type.circular)
        .filter_map(|attr_type| attr_type.reference)
        .collect()
}
