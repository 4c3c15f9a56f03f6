use super::{ClassId, Restrictions, Tag};
use crate::datatype::DataType;
use crate::namespaces;
use crate::text;
use serde::{Deserialize, Serialize};

/// Index of attrs that must stay after every other attr of their class.
pub const SUFFIX_INDEX: usize = usize::MAX;

/// One candidate type of an [`Attr`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttrType {
    pub qname: String,
    pub alias: Option<String>,
    pub reference: Option<ClassId>,
    pub native: bool,
    pub forward: bool,
    pub circular: bool,
    pub substituted: bool,
}

impl AttrType {
    /// Reference to a global type, resolved later.
    pub fn new(qname: impl Into<String>) -> Self {
        let qname = qname.into();
        let native = DataType::from_qname(&qname).is_some();
        Self {
            qname,
            alias: None,
            reference: None,
            native,
            forward: false,
            circular: false,
            substituted: false,
        }
    }

    pub fn native(datatype: DataType) -> Self {
        Self {
            native: true,
            ..Self::new(datatype.qname())
        }
    }

    /// Reference to an inner class of the owning class.
    pub fn forward(qname: impl Into<String>) -> Self {
        Self {
            forward: true,
            native: false,
            ..Self::new(qname)
        }
    }

    pub fn datatype(&self) -> Option<DataType> {
        if self.native {
            DataType::from_qname(&self.qname)
        } else {
            None
        }
    }

    pub fn name(&self) -> &str {
        namespaces::local_name(&self.qname)
    }

    /// Whether this type points at another class that must exist before rendering.
    pub fn is_dependency(&self, allow_circular: bool) -> bool {
        !(self.forward || self.native || (!allow_circular && self.circular))
    }

    pub fn is_any_type(&self) -> bool {
        matches!(
            self.datatype(),
            Some(DataType::AnyType | DataType::AnySimpleType)
        )
    }

    /// Turn into a native type, dropping every resolution flag.
    pub fn reset_native(&mut self, datatype: DataType) {
        self.qname = datatype.qname();
        self.native = true;
        self.forward = false;
        self.circular = false;
        self.reference = None;
    }
}

/// One field of a [`Class`](super::Class).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attr {
    pub tag: Tag,
    /// Schema name, kept as-is for the wire.
    pub name: String,
    /// Generation name override set when the schema name clashes.
    pub local_name: Option<String>,
    pub index: usize,
    pub default: Option<String>,
    pub fixed: bool,
    pub mixed: bool,
    pub types: Vec<AttrType>,
    pub choices: Vec<Attr>,
    pub namespace: Option<String>,
    pub help: Option<String>,
    pub restrictions: Restrictions,
    /// Head qname when this attr stands in for a substitution group member.
    pub substitution: Option<String>,
}

impl Attr {
    pub fn new(tag: Tag, name: impl Into<String>, attr_type: AttrType) -> Self {
        Self {
            types: vec![attr_type],
            ..Self::untyped(tag, name)
        }
    }

    pub fn untyped(tag: Tag, name: impl Into<String>) -> Self {
        Self {
            tag,
            name: name.into(),
            local_name: None,
            index: 0,
            default: None,
            fixed: false,
            mixed: false,
            types: Vec::new(),
            choices: Vec::new(),
            namespace: None,
            help: None,
            restrictions: Restrictions::default(),
            substitution: None,
        }
    }

    /// The name a renderer should use for this field.
    pub fn field_name(&self) -> &str {
        self.local_name.as_deref().unwrap_or(&self.name)
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.local_name = Some(name.into());
    }

    pub fn slug(&self) -> String {
        text::alnum(self.field_name())
    }

    /// Identity on the wire: tag, namespace and schema name.
    pub fn key(&self) -> (Tag, Option<&str>, &str) {
        (self.tag, self.namespace.as_deref(), &self.name)
    }

    pub fn is_attribute(&self) -> bool {
        self.tag.is_xml_attribute()
    }

    pub fn is_element(&self) -> bool {
        self.tag == Tag::Element
    }

    pub fn is_enumeration(&self) -> bool {
        self.tag == Tag::Enumeration
    }

    pub fn is_group(&self) -> bool {
        matches!(self.tag, Tag::Group | Tag::AttributeGroup)
    }

    pub fn is_wildcard(&self) -> bool {
        self.tag.is_wildcard()
    }

    pub fn is_choice(&self) -> bool {
        self.tag == Tag::Choice
    }

    pub fn is_suffix(&self) -> bool {
        self.index == SUFFIX_INDEX
    }

    pub fn is_list(&self) -> bool {
        self.restrictions.is_list()
    }

    pub fn is_optional(&self) -> bool {
        self.restrictions.is_optional()
    }

    pub fn is_prohibited(&self) -> bool {
        self.restrictions.is_prohibited()
    }

    pub fn is_nillable(&self) -> bool {
        self.restrictions.nillable == Some(true)
    }

    pub fn is_any_type(&self) -> bool {
        self.types.iter().any(AttrType::is_any_type)
    }

    pub fn is_circular_ref(&self) -> bool {
        self.types.iter().any(|tp| tp.circular)
    }

    /// Nodes serialized as text content, attributes or child elements.
    pub fn xml_type(&self) -> XmlType {
        match self.tag {
            Tag::Attribute => XmlType::Attribute,
            Tag::AnyAttribute => XmlType::Attributes,
            Tag::Any => XmlType::Wildcard,
            Tag::Element | Tag::Choice => XmlType::Element,
            _ => XmlType::Text,
        }
    }

    pub fn native_types(&self) -> impl Iterator<Item = DataType> + '_ {
        self.types.iter().filter_map(AttrType::datatype)
    }

    /// Every type of this attr and of its compound choices.
    pub fn all_types(&self) -> impl Iterator<Item = &AttrType> {
        self.types
            .iter()
            .chain(self.choices.iter().flat_map(|choice| choice.types.iter()))
    }

    pub fn all_types_mut(&mut self) -> impl Iterator<Item = &mut AttrType> {
        self.types
            .iter_mut()
            .chain(self.choices.iter_mut().flat_map(|choice| choice.types.iter_mut()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum XmlType {
    Text,
    Attribute,
    Attributes,
    Element,
    Wildcard,
}
