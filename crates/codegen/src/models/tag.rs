use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema construct a class or attr was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    All,
    Any,
    AnyAttribute,
    Attribute,
    AttributeGroup,
    BindingMessage,
    BindingOperation,
    Choice,
    ComplexType,
    Element,
    Enumeration,
    Extension,
    Group,
    List,
    Message,
    Override,
    Redefine,
    Restriction,
    Schema,
    Sequence,
    SimpleContent,
    SimpleType,
    Union,
}

impl Tag {
    pub fn as_str(self) -> &'static str {
        match self {
            Tag::All => "All",
            Tag::Any => "Any",
            Tag::AnyAttribute => "AnyAttribute",
            Tag::Attribute => "Attribute",
            Tag::AttributeGroup => "AttributeGroup",
            Tag::BindingMessage => "BindingMessage",
            Tag::BindingOperation => "BindingOperation",
            Tag::Choice => "Choice",
            Tag::ComplexType => "ComplexType",
            Tag::Element => "Element",
            Tag::Enumeration => "Enumeration",
            Tag::Extension => "Extension",
            Tag::Group => "Group",
            Tag::List => "List",
            Tag::Message => "Message",
            Tag::Override => "Override",
            Tag::Redefine => "Redefine",
            Tag::Restriction => "Restriction",
            Tag::Schema => "Schema",
            Tag::Sequence => "Sequence",
            Tag::SimpleContent => "SimpleContent",
            Tag::SimpleType => "SimpleType",
            Tag::Union => "Union",
        }
    }

    /// Tags of classes rendered as complex structures.
    pub fn is_complex(self) -> bool {
        matches!(
            self,
            Tag::BindingMessage | Tag::BindingOperation | Tag::ComplexType | Tag::Element
        )
    }

    /// Tags of classes that are document roots on their own.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            Tag::BindingMessage | Tag::BindingOperation | Tag::Element | Tag::Message
        )
    }

    /// Tags of attrs that hold the text value of a simple type.
    pub fn is_simple_value(self) -> bool {
        matches!(
            self,
            Tag::Extension | Tag::Restriction | Tag::List | Tag::Union | Tag::SimpleType
        )
    }

    /// Tags of attrs serialized as XML attributes rather than child nodes.
    pub fn is_xml_attribute(self) -> bool {
        matches!(self, Tag::Attribute | Tag::AnyAttribute)
    }

    pub fn is_wildcard(self) -> bool {
        matches!(self, Tag::Any | Tag::AnyAttribute)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
