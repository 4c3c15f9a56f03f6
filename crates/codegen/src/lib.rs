//! # schemagen-codegen
//!
//! Normalization and resolution engine for schema-to-code generators.
//!
//! Upstream parsers (XSD, DTD, WSDL, JSON) produce a flat list of raw [`Class`] models whose
//! attribute types are still plain qualified names. This crate turns them into a consistent,
//! fully resolved set of classes that a renderer can emit without further analysis.
//!
//! ## Architecture
//!
//! 1. **Validate** - merge duplicate and redefined classes ([`validator::ClassValidator`])
//! 2. **Ungroup** - inline `xs:group` / `xs:attributeGroup` references
//! 3. **Flatten** - resolve extensions, substitution groups and attribute types
//! 4. **Sanitize / Resolve / Cleanup** - rename clashes, check overrides, vacuum inner classes
//! 5. **Finalize** - circular references, compound choice fields, sequence numbers
//! 6. **Designate** - unique class names, reference validation, package assignment
//!
//! ## Modules
//!
//! - `models`: `Class`, `Attr`, `AttrType`, `Restrictions`, `Extension`
//! - `container`: the `ClassContainer` registry and step orchestration
//! - `handlers`: one module per transformation pass
//! - `utils`: attribute and inner class copying shared by the handlers
//!
//! ## Usage
//!
//! ```no_run
//! use schemagen_codegen::{Attr, AttrType, Class, ClassContainer, GeneratorConfig, Tag};
//!
//! let mut container = ClassContainer::new(GeneratorConfig::default());
//!
//! let mut root = Class::new("{urn:books}book", Tag::Element, "books.xsd");
//! root.attrs.push(Attr::new(Tag::Element, "title", AttrType::new("{urn:books}titleType")));
//! container.add(root);
//!
//! container.process()?;
//!
//! for class in container.classes() {
//!     println!("{} -> {:?}", class.qname, class.module);
//! }
//! # Ok::<(), schemagen_codegen::CodegenError>(())
//! ```

pub mod config;
pub mod container;
pub mod datatype;
pub mod handlers;
pub mod models;
pub mod namespaces;
pub mod text;
pub mod utils;
pub mod validator;

#[cfg(test)]
pub(crate) mod testing;

use thiserror::Error;

pub use config::{CompoundFields, FilterStrategy, GeneratorConfig, OutputConfig, StructureStyle};
pub use container::{ClassContainer, Step};
pub use datatype::DataType;
pub use models::*;

#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("Missing inner class {parent}.{missing}")]
    MissingInnerClass { parent: String, missing: String },

    #[error("Group attribute not found: `{0}`")]
    MissingGroup(String),

    #[error("Enumeration class with a complex extension: `{target}` -> `{base}`")]
    AmbiguousEnumExtension { target: String, base: String },

    #[error("Unresolved reference: {class}.{attr}[{qname}]")]
    UnresolvedReference {
        class: String,
        attr: String,
        qname: String,
    },

    #[error("Misrepresented forward reference: {class}.{attr}[{qname}]")]
    MisrepresentedReference {
        class: String,
        attr: String,
        qname: String,
    },

    #[error("Duplicate class qname: `{0}`")]
    DuplicateClass(String),

    #[error("Cross reference detected: `{0}`")]
    CrossReference(String),

    #[error("Invalid parent class reference: `{0}`")]
    InvalidParent(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON configuration error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CodegenError {
    pub fn missing_inner(parent: impl Into<String>, missing: impl Into<String>) -> Self {
        CodegenError::MissingInnerClass {
            parent: parent.into(),
            missing: missing.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        CodegenError::Config(message.into())
    }
}

pub type Result<T> = std::result::Result<T, CodegenError>;
