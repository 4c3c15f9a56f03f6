//! Class registry and step orchestration.
//!
//! Every [`Class`] lives in one arena owned by the [`ClassContainer`] and is addressed by its
//! [`ClassId`]. Global classes are additionally registered by qname; inner classes are only
//! reachable through their parent's `inner` list.
//!
//! Steps run their handlers over every registered class. A handler that needs another class
//! fully processed for the current step asks for it through [`ClassContainer::find`], which
//! processes the dependency first when its status lags behind. Classes mid-processing are
//! never re-entered, which is what keeps mutually dependent classes from recursing forever.

use crate::config::GeneratorConfig;
use crate::handlers::{
    AddAttributeSubstitutions, CalculateAttributePaths, ClassHandler, ContainerHandler,
    CreateCompoundFields, DesignateClassPackages, DetectCircularReferences, DisambiguateChoices,
    FilterClasses, FlattenAttributeGroups, FlattenClassExtensions, MergeAttributes,
    ProcessAttributeTypes, ProcessMixedContentClass, RenameDuplicateAttributes,
    RenameDuplicateClasses, ResetAttributeSequenceNumbers, ResetAttributeSequences,
    SanitizeAttributesDefaultValue, SanitizeEnumerationClass, UnnestInnerClasses,
    UpdateAttributesEffectiveChoice, ValidateAttributesOverrides, ValidateReferences,
    VacuumInnerClasses,
};
use crate::models::{Class, ClassId, GroupId, Status};
use crate::utils;
use crate::validator::ClassValidator;
use crate::Result;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, trace};

/// Ordered processing steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Ungroup,
    Flatten,
    Sanitize,
    Resolve,
    Cleanup,
    Finalize,
}

impl Step {
    pub const ALL: [Step; 6] = [
        Step::Ungroup,
        Step::Flatten,
        Step::Sanitize,
        Step::Resolve,
        Step::Cleanup,
        Step::Finalize,
    ];

    /// Status of a class while the step runs on it.
    pub fn entering(self) -> Status {
        match self {
            Step::Ungroup => Status::Ungrouping,
            Step::Flatten => Status::Flattening,
            Step::Sanitize => Status::Sanitizing,
            Step::Resolve => Status::Resolving,
            Step::Cleanup => Status::Cleaning,
            Step::Finalize => Status::Finalizing,
        }
    }

    /// Status of a class once the step is done with it.
    pub fn exited(self) -> Status {
        match self {
            Step::Ungroup => Status::Ungrouped,
            Step::Flatten => Status::Flattened,
            Step::Sanitize => Status::Sanitized,
            Step::Resolve => Status::Resolved,
            Step::Cleanup => Status::Cleaned,
            Step::Finalize => Status::Processed,
        }
    }
}

type Handlers = Rc<[Box<dyn ClassHandler>]>;

/// First id handed out for synthetic choice groups, above any parser assigned id.
const SYNTHETIC_GROUP_BASE: GroupId = 1 << 40;

#[derive(Debug)]
pub struct ClassContainer {
    config: GeneratorConfig,
    arena: Vec<Class>,
    data: HashMap<String, Vec<ClassId>>,
    order: Vec<String>,
    step: Option<Step>,
    processors: BTreeMap<Step, Handlers>,
    next_group: GroupId,
}

impl ClassContainer {
    pub fn new(config: GeneratorConfig) -> Self {
        Self {
            config,
            arena: Vec::new(),
            data: HashMap::new(),
            order: Vec::new(),
            step: None,
            processors: default_processors(),
            next_group: SYNTHETIC_GROUP_BASE,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// The step currently running, if any.
    pub fn step(&self) -> Option<Step> {
        self.step
    }

    // ========================================================================
    // Arena and registry
    // ========================================================================

    /// Store a class without registering it.
    pub(crate) fn alloc(&mut self, class: Class) -> ClassId {
        let id = ClassId(self.arena.len());
        self.arena.push(class);
        id
    }

    /// Register a global class.
    pub fn add(&mut self, class: Class) -> ClassId {
        let id = self.alloc(class);
        self.register(id);
        id
    }

    pub fn extend(&mut self, classes: impl IntoIterator<Item = Class>) -> Vec<ClassId> {
        classes.into_iter().map(|class| self.add(class)).collect()
    }

    /// Store a class as an inner class of `parent`.
    pub fn add_inner(&mut self, parent: ClassId, mut class: Class) -> ClassId {
        class.parent = Some(parent);
        let id = self.alloc(class);
        self.arena[parent.0].inner.push(id);
        id
    }

    pub(crate) fn register(&mut self, id: ClassId) {
        let qname = self.arena[id.0].qname.clone();
        match self.data.get_mut(&qname) {
            Some(ids) => ids.push(id),
            None => {
                self.order.push(qname.clone());
                self.data.insert(qname, vec![id]);
            }
        }
    }

    pub fn class(&self, id: ClassId) -> &Class {
        &self.arena[id.0]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut Class {
        &mut self.arena[id.0]
    }

    /// Registered classes in registration order.
    pub fn ids(&self) -> Vec<ClassId> {
        self.order
            .iter()
            .filter_map(|qname| self.data.get(qname))
            .flatten()
            .copied()
            .collect()
    }

    pub fn classes(&self) -> impl Iterator<Item = &Class> + '_ {
        self.ids().into_iter().map(move |id| &self.arena[id.0])
    }

    pub fn len(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_registered(&self, id: ClassId) -> bool {
        self.data
            .get(&self.arena[id.0].qname)
            .is_some_and(|ids| ids.contains(&id))
    }

    /// Registered classes with the given qname, without any processing.
    pub fn find_all(&self, qname: &str) -> Vec<ClassId> {
        self.data.get(qname).cloned().unwrap_or_default()
    }

    /// First registered class with the given qname, without any processing.
    pub fn first(&self, qname: &str) -> Option<ClassId> {
        self.data.get(qname).and_then(|ids| ids.first().copied())
    }

    /// Re-register a class whose qname changed from `previous`.
    pub fn reset(&mut self, id: ClassId, previous: &str) {
        if let Some(ids) = self.data.get_mut(previous) {
            ids.retain(|other| *other != id);
        }
        self.register(id);
    }

    pub fn remove(&mut self, id: ClassId) {
        let qname = &self.arena[id.0].qname;
        if let Some(ids) = self.data.get_mut(qname) {
            ids.retain(|other| *other != id);
        }
    }

    /// Replace the registry with the given classes, keeping their order.
    pub fn set(&mut self, ids: Vec<ClassId>) {
        self.data.clear();
        self.order.clear();
        for id in ids {
            self.register(id);
        }
    }

    /// Deep copy a class and its inner classes into fresh arena slots.
    ///
    /// References between classes of the copied subtree are rewritten to the copies; the new
    /// root is neither registered nor attached to a parent.
    pub fn clone_class(&mut self, id: ClassId) -> ClassId {
        let mut mapping = HashMap::new();
        let root = self.clone_subtree(id, &mut mapping);

        for new_id in mapping.values().copied().collect::<Vec<_>>() {
            for tp in self.arena[new_id.0].types_mut() {
                if let Some(target) = tp.reference.and_then(|old| mapping.get(&old)) {
                    tp.reference = Some(*target);
                }
            }
        }
        root
    }

    fn clone_subtree(&mut self, id: ClassId, mapping: &mut HashMap<ClassId, ClassId>) -> ClassId {
        let mut clone = self.arena[id.0].clone();
        let inner = std::mem::take(&mut clone.inner);
        let new_id = self.alloc(clone);
        mapping.insert(id, new_id);

        let mut cloned_inner = Vec::with_capacity(inner.len());
        for child in inner {
            let child_clone = self.clone_subtree(child, mapping);
            self.arena[child_clone.0].parent = Some(new_id);
            cloned_inner.push(child_clone);
        }
        self.arena[new_id.0].inner = cloned_inner;
        new_id
    }

    /// The class and all its inner classes, depth first.
    pub fn walk(&self, id: ClassId) -> Vec<ClassId> {
        let mut result = vec![id];
        let mut index = 0;
        while index < result.len() {
            let current = result[index];
            result.extend(self.arena[current.0].inner.iter().copied());
            index += 1;
        }
        result
    }

    /// Every registered class plus all their inner classes.
    pub fn all_ids(&self) -> Vec<ClassId> {
        self.ids().into_iter().flat_map(|id| self.walk(id)).collect()
    }

    /// Qualified names this class and its inner classes depend on.
    pub fn dependencies(&self, id: ClassId, allow_circular: bool) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for class_id in self.walk(id) {
            for tp in self.arena[class_id.0].types() {
                if tp.is_dependency(allow_circular) && seen.insert(tp.qname.as_str()) {
                    result.push(tp.qname.clone());
                }
            }
        }
        result
    }

    /// Structural equality of two classes, inner classes included.
    pub fn same_content(&self, a: ClassId, b: ClassId) -> bool {
        let (x, y) = (&self.arena[a.0], &self.arena[b.0]);
        x.qname == y.qname
            && x.tag == y.tag
            && x.location == y.location
            && x.r#abstract == y.r#abstract
            && x.mixed == y.mixed
            && x.nillable == y.nillable
            && x.namespace == y.namespace
            && x.default == y.default
            && x.fixed == y.fixed
            && x.substitutions == y.substitutions
            && x.extensions == y.extensions
            && x.attrs == y.attrs
            && x.inner.len() == y.inner.len()
            && x.inner
                .iter()
                .zip(&y.inner)
                .all(|(i, j)| self.same_content(*i, *j))
    }

    /// Fresh group id for synthetic choices.
    pub fn next_group_id(&mut self) -> GroupId {
        self.next_group += 1;
        self.next_group
    }

    // ========================================================================
    // Lookups with on-demand processing
    // ========================================================================

    /// First class with `qname` matching `condition`, processed up to the current step.
    pub fn find(
        &mut self,
        qname: &str,
        condition: impl Fn(&Class) -> bool,
    ) -> Result<Option<ClassId>> {
        loop {
            let Some(found) = self
                .data
                .get(qname)
                .and_then(|ids| ids.iter().copied().find(|id| condition(&self.arena[id.0])))
            else {
                return Ok(None);
            };

            match self.step {
                Some(step) if self.arena[found.0].status < step.entering() => {
                    trace!(qname, ?step, "processing dependency on demand");
                    self.process_class(found, step)?;
                }
                _ => return Ok(Some(found)),
            }
        }
    }

    pub fn find_any(&mut self, qname: &str) -> Result<Option<ClassId>> {
        self.find(qname, |_| true)
    }

    /// Inner class of `source` with `qname`, processed up to the current step.
    pub fn find_inner(&mut self, source: ClassId, qname: &str) -> Result<ClassId> {
        let inner = utils::find_inner(self, source, qname)?;
        if let Some(step) = self.step {
            if self.arena[inner.0].status < step.entering() {
                trace!(qname, ?step, "processing inner class on demand");
                self.process_class(inner, step)?;
            }
        }
        Ok(inner)
    }

    // ========================================================================
    // Pipeline
    // ========================================================================

    /// Run the whole pipeline over the registered classes.
    pub fn process(&mut self) -> Result<()> {
        self.config.validate()?;

        ClassValidator.run(self)?;
        self.process_classes(Step::Ungroup)?;
        self.remove_groups();
        self.process_classes(Step::Flatten)?;
        self.filter_classes()?;
        self.process_classes(Step::Sanitize)?;
        self.process_classes(Step::Resolve)?;
        self.process_classes(Step::Cleanup)?;
        self.process_classes(Step::Finalize)?;
        self.designate_classes()
    }

    pub fn process_classes(&mut self, step: Step) -> Result<()> {
        self.step = Some(step);
        debug!(?step, classes = self.len(), "step started");

        // Handlers may register new classes, keep going until nothing lags behind.
        loop {
            let pending: Vec<ClassId> = self
                .ids()
                .into_iter()
                .filter(|id| self.arena[id.0].status < step.entering())
                .collect();
            if pending.is_empty() {
                break;
            }

            for id in pending {
                if self.arena[id.0].status < step.entering() {
                    self.process_class(id, step)?;
                }
            }
        }

        debug!(?step, classes = self.len(), "step finished");
        Ok(())
    }

    pub fn process_class(&mut self, target: ClassId, step: Step) -> Result<()> {
        self.arena[target.0].status = step.entering();

        if let Some(handlers) = self.processors.get(&step).cloned() {
            for handler in handlers.iter() {
                handler.process(self, target)?;
            }
        }

        for inner in self.arena[target.0].inner.clone() {
            if self.arena[inner.0].status < step.entering() {
                self.process_class(inner, step)?;
            }
        }

        self.arena[target.0].status = step.exited();
        Ok(())
    }

    /// Drop `xs:group` and `xs:attributeGroup` classes once they have been inlined.
    pub fn remove_groups(&mut self) {
        let arena = &self.arena;
        for ids in self.data.values_mut() {
            ids.retain(|id| !arena[id.0].is_group());
        }
    }

    pub fn filter_classes(&mut self) -> Result<()> {
        FilterClasses.run(self)
    }

    /// Give every class a unique name, check references and assign packages.
    pub fn designate_classes(&mut self) -> Result<()> {
        RenameDuplicateClasses.run(self)?;
        ValidateReferences.run(self)?;
        DesignateClassPackages.run(self)
    }

    #[cfg(test)]
    pub(crate) fn set_processors(&mut self, step: Step, handlers: Vec<Box<dyn ClassHandler>>) {
        self.processors.insert(step, Rc::from(handlers));
    }
}

fn default_processors() -> BTreeMap<Step, Handlers> {
    fn handlers(list: Vec<Box<dyn ClassHandler>>) -> Handlers {
        Rc::from(list)
    }

    BTreeMap::from([
        (Step::Ungroup, handlers(vec![Box::new(FlattenAttributeGroups)])),
        (
            Step::Flatten,
            handlers(vec![
                Box::new(CalculateAttributePaths),
                Box::new(FlattenClassExtensions),
                Box::new(SanitizeEnumerationClass),
                // Runs here, not in FINALIZE, so repeated elements still share their names.
                Box::new(UpdateAttributesEffectiveChoice),
                Box::new(UnnestInnerClasses),
                Box::new(AddAttributeSubstitutions::default()),
                Box::new(ProcessAttributeTypes),
                Box::new(MergeAttributes),
                Box::new(ProcessMixedContentClass),
            ]),
        ),
        (
            Step::Sanitize,
            handlers(vec![
                Box::new(ResetAttributeSequences),
                Box::new(RenameDuplicateAttributes),
                Box::new(SanitizeAttributesDefaultValue),
            ]),
        ),
        (
            Step::Resolve,
            handlers(vec![Box::new(ValidateAttributesOverrides)]),
        ),
        (Step::Cleanup, handlers(vec![Box::new(VacuumInnerClasses)])),
        (
            Step::Finalize,
            handlers(vec![
                Box::new(DetectCircularReferences::default()),
                Box::new(CreateCompoundFields),
                Box::new(DisambiguateChoices),
                Box::new(ResetAttributeSequenceNumbers),
            ]),
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Tag;
    use crate::testing::ClassFactory;
    use std::cell::RefCell;

    #[derive(Debug, Default)]
    struct Recorder {
        seen: Rc<RefCell<Vec<String>>>,
    }

    impl ClassHandler for Recorder {
        fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
            let qname = container.class(target).qname.clone();
            self.seen.borrow_mut().push(qname);
            Ok(())
        }
    }

    /// Looks up every dependency qname on each class, like a resolving handler would.
    #[derive(Debug)]
    struct ResolveDependencies;

    impl ClassHandler for ResolveDependencies {
        fn process(&self, container: &mut ClassContainer, target: ClassId) -> Result<()> {
            for qname in container.dependencies(target, true) {
                container.find_any(&qname)?;
            }
            Ok(())
        }
    }

    #[test]
    fn test_registry_allows_duplicate_qnames() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let element = container.add(ClassFactory::create("{urn:a}item", Tag::Element));
        let complex = container.add(ClassFactory::create("{urn:a}item", Tag::ComplexType));

        assert_eq!(container.len(), 2);
        assert_eq!(container.find_all("{urn:a}item"), vec![element, complex]);

        let found = container
            .find("{urn:a}item", |class| class.tag == Tag::ComplexType)
            .unwrap();
        assert_eq!(found, Some(complex));
        assert_eq!(container.find_any("{urn:a}missing").unwrap(), None);
    }

    #[test]
    fn test_find_processes_lagging_dependency_first() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        container.set_processors(
            Step::Flatten,
            vec![
                Box::new(ResolveDependencies),
                Box::new(Recorder { seen: seen.clone() }),
            ],
        );

        let a = ClassFactory::with_element_of("{urn:a}A", "{urn:a}B");
        let b = ClassFactory::create("{urn:a}B", Tag::ComplexType);
        container.add(a);
        container.add(b);

        container.process_classes(Step::Flatten).unwrap();

        assert_eq!(*seen.borrow(), vec!["{urn:a}B", "{urn:a}A"]);
        for class in container.classes() {
            assert_eq!(class.status, Status::Flattened);
        }
    }

    #[test]
    fn test_mutual_dependencies_terminate() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        container.set_processors(
            Step::Flatten,
            vec![
                Box::new(ResolveDependencies),
                Box::new(Recorder { seen: seen.clone() }),
            ],
        );

        container.add(ClassFactory::with_element_of("{urn:a}A", "{urn:a}B"));
        container.add(ClassFactory::with_element_of("{urn:a}B", "{urn:a}A"));

        container.process_classes(Step::Flatten).unwrap();

        assert_eq!(*seen.borrow(), vec!["{urn:a}B", "{urn:a}A"]);
    }

    #[test]
    fn test_inner_classes_follow_their_parent() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        container.set_processors(Step::Sanitize, vec![Box::new(Recorder { seen: seen.clone() })]);

        let outer = container.add(ClassFactory::create("{urn:a}outer", Tag::Element));
        let inner = container.add_inner(outer, ClassFactory::create("{urn:a}inner", Tag::ComplexType));

        container.process_classes(Step::Sanitize).unwrap();

        assert_eq!(*seen.borrow(), vec!["{urn:a}outer", "{urn:a}inner"]);
        assert_eq!(container.class(inner).status, Status::Sanitized);
        assert_eq!(container.class(inner).parent, Some(outer));
    }

    #[test]
    fn test_find_inner_reports_missing_class() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let outer = container.add(ClassFactory::create("{urn:a}outer", Tag::Element));

        let err = container.find_inner(outer, "{urn:a}nope").unwrap_err();
        assert_eq!(err.to_string(), "Missing inner class {urn:a}outer.{urn:a}nope");
    }

    #[test]
    fn test_clone_class_rewrites_internal_references() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let outer = container.add(ClassFactory::create("{urn:a}outer", Tag::Element));
        let inner = container.add_inner(outer, ClassFactory::create("{urn:a}inner", Tag::ComplexType));
        let mut attr = crate::testing::AttrFactory::element("child");
        attr.types = vec![crate::models::AttrType::forward("{urn:a}inner")];
        attr.types[0].reference = Some(inner);
        container.class_mut(outer).attrs.push(attr);

        let copy = container.clone_class(outer);
        let copied_inner = container.class(copy).inner[0];

        assert_ne!(copied_inner, inner);
        assert_eq!(container.class(copied_inner).parent, Some(copy));
        assert_eq!(container.class(copy).attrs[0].types[0].reference, Some(copied_inner));
        assert!(!container.is_registered(copy));
    }

    #[test]
    fn test_reset_moves_registration() {
        let mut container = ClassContainer::new(GeneratorConfig::default());
        let id = container.add(ClassFactory::create("{urn:a}old", Tag::Element));
        container.class_mut(id).qname = "{urn:a}new".into();
        container.reset(id, "{urn:a}old");

        assert_eq!(container.first("{urn:a}old"), None);
        assert_eq!(container.first("{urn:a}new"), Some(id));
        assert_eq!(container.len(), 1);
    }
}
