//! Builders for the class model used by the unit tests.

use crate::datatype::DataType;
use crate::models::{Attr, AttrType, Class, Extension, Tag};
use crate::namespaces;
use std::sync::atomic::{AtomicU32, Ordering};

/// Counter for generating unique attr names
static ATTR_COUNTER: AtomicU32 = AtomicU32::new(0);

pub(crate) struct ClassFactory;

impl ClassFactory {
    pub fn create(qname: &str, tag: Tag) -> Class {
        let mut class = Class::new(qname, tag, "schemas/types.xsd");
        class.namespace = namespaces::target_namespace(qname).map(str::to_string);
        class
    }

    /// A complex type with one element of the given type, named after the type.
    pub fn with_element_of(qname: &str, type_qname: &str) -> Class {
        let mut class = Self::create(qname, Tag::ComplexType);
        class.attrs.push(AttrFactory::reference(
            Tag::Element,
            namespaces::local_name(type_qname),
            type_qname,
        ));
        class
    }

    pub fn elements(qname: &str, names: &[&str]) -> Class {
        let mut class = Self::create(qname, Tag::ComplexType);
        class.attrs = names.iter().map(|name| AttrFactory::element(name)).collect();
        class
    }

    pub fn enumeration(qname: &str, members: &[&str]) -> Class {
        let mut class = Self::create(qname, Tag::SimpleType);
        class.attrs = members
            .iter()
            .map(|member| AttrFactory::enumeration(member, member))
            .collect();
        class
    }
}

pub(crate) struct AttrFactory;

impl AttrFactory {
    /// A string element with a generated name.
    pub fn create() -> Attr {
        let counter = ATTR_COUNTER.fetch_add(1, Ordering::SeqCst);
        Self::element(&format!("attr_{counter}"))
    }

    pub fn element(name: &str) -> Attr {
        Self::native(Tag::Element, name, DataType::String)
    }

    pub fn attribute(name: &str) -> Attr {
        Self::native(Tag::Attribute, name, DataType::String)
    }

    pub fn native(tag: Tag, name: &str, datatype: DataType) -> Attr {
        Attr::new(tag, name, AttrType::native(datatype))
    }

    pub fn reference(tag: Tag, name: &str, qname: &str) -> Attr {
        Attr::new(tag, name, AttrType::new(qname))
    }

    pub fn forward(name: &str, qname: &str) -> Attr {
        Attr::new(Tag::Element, name, AttrType::forward(qname))
    }

    pub fn enumeration(name: &str, default: &str) -> Attr {
        let mut attr = Self::native(Tag::Enumeration, name, DataType::String);
        attr.default = Some(default.to_string());
        attr
    }

    pub fn any() -> Attr {
        let mut attr = Self::native(Tag::Any, "@any", DataType::AnyType);
        attr.namespace = Some(namespaces::ANY_NAMESPACE.to_string());
        attr
    }
}

pub(crate) struct ExtensionFactory;

impl ExtensionFactory {
    pub fn reference(qname: &str) -> Extension {
        Extension::new(Tag::Extension, AttrType::new(qname))
    }

    pub fn restriction(qname: &str) -> Extension {
        Extension::new(Tag::Restriction, AttrType::new(qname))
    }

    pub fn native(datatype: DataType) -> Extension {
        Extension::new(Tag::Extension, AttrType::native(datatype))
    }
}
