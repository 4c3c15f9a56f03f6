use super::{Attr, AttrType, ClassId, Restrictions, Status, Tag};
use crate::namespaces;
use serde::{Deserialize, Serialize};

/// A base type reference of a [`Class`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extension {
    /// `Extension` adds to the base, `Restriction` constrains it.
    pub tag: Tag,
    pub r#type: AttrType,
    pub restrictions: Restrictions,
}

impl Extension {
    pub fn new(tag: Tag, r#type: AttrType) -> Self {
        Self {
            tag,
            r#type,
            restrictions: Restrictions::default(),
        }
    }
}

/// One schema defined type.
///
/// Inner classes live in the container arena; `inner` holds their ids and every inner class
/// points back through `parent`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Class {
    pub qname: String,
    pub tag: Tag,
    pub location: String,
    /// Schema construct the class was declared under (Schema, Redefine, Override).
    pub container: Option<Tag>,
    pub r#abstract: bool,
    pub mixed: bool,
    pub nillable: bool,
    pub strict_type: bool,
    pub local_type: bool,
    pub status: Status,
    pub namespace: Option<String>,
    pub help: Option<String>,
    pub meta_name: Option<String>,
    pub default: Option<String>,
    pub fixed: bool,
    pub substitutions: Vec<String>,
    pub extensions: Vec<Extension>,
    pub attrs: Vec<Attr>,
    pub inner: Vec<ClassId>,
    pub parent: Option<ClassId>,
    pub package: Option<String>,
    pub module: Option<String>,
}

impl Class {
    pub fn new(qname: impl Into<String>, tag: Tag, location: impl Into<String>) -> Self {
        Self {
            qname: qname.into(),
            tag,
            location: location.into(),
            container: None,
            r#abstract: false,
            mixed: false,
            nillable: false,
            strict_type: false,
            local_type: false,
            status: Status::Raw,
            namespace: None,
            help: None,
            meta_name: None,
            default: None,
            fixed: false,
            substitutions: Vec::new(),
            extensions: Vec::new(),
            attrs: Vec::new(),
            inner: Vec::new(),
            parent: None,
            package: None,
            module: None,
        }
    }

    pub fn name(&self) -> &str {
        namespaces::local_name(&self.qname)
    }

    pub fn target_namespace(&self) -> Option<&str> {
        namespaces::target_namespace(&self.qname)
    }

    pub fn is_complex(&self) -> bool {
        self.tag.is_complex()
    }

    pub fn is_element(&self) -> bool {
        self.tag == Tag::Element
    }

    pub fn is_group(&self) -> bool {
        matches!(self.tag, Tag::Group | Tag::AttributeGroup)
    }

    pub fn is_enumeration(&self) -> bool {
        !self.attrs.is_empty() && self.attrs.iter().all(Attr::is_enumeration)
    }

    /// A class wrapping a single text value.
    pub fn is_simple_type(&self) -> bool {
        self.attrs.len() == 1 && self.attrs[0].tag.is_simple_value()
    }

    pub fn is_global_type(&self) -> bool {
        !self.r#abstract && !self.local_type && self.tag.is_global()
    }

    pub fn is_mixed(&self) -> bool {
        self.mixed
    }

    pub fn is_restricted(&self) -> bool {
        self.extensions.iter().any(|ext| ext.tag == Tag::Restriction)
    }

    pub fn has_suffix_attr(&self) -> bool {
        self.attrs.iter().any(Attr::is_suffix)
    }

    /// Every type referenced by attrs, compound choices and extensions.
    pub fn types(&self) -> impl Iterator<Item = &AttrType> {
        self.attrs
            .iter()
            .flat_map(Attr::all_types)
            .chain(self.extensions.iter().map(|ext| &ext.r#type))
    }

    pub fn types_mut(&mut self) -> impl Iterator<Item = &mut AttrType> {
        self.attrs
            .iter_mut()
            .flat_map(Attr::all_types_mut)
            .chain(self.extensions.iter_mut().map(|ext| &mut ext.r#type))
    }

    /// Resolved class references of this class alone, inner classes excluded.
    pub fn references(&self) -> impl Iterator<Item = ClassId> + '_ {
        self.types().filter_map(|tp| tp.reference)
    }
}
