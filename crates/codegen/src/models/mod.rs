//! Intermediate class model shared by every pass.

mod attr;
mod class;
mod restrictions;
mod tag;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use attr::{Attr, AttrType, XmlType, SUFFIX_INDEX};
pub use class::{Class, Extension};
pub use restrictions::{
    add_occurs, mul_occurs, CompositorKind, GroupId, PathEntry, Restrictions, UNBOUNDED,
};
pub use tag::Tag;

/// Stable handle of a class stored in a [`ClassContainer`](crate::ClassContainer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClassId(pub(crate) usize);

impl ClassId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Processing watermark of a class.
///
/// Entering a step sets the step's value, leaving it sets the value plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    Raw = 0,
    Ungrouping = 10,
    Ungrouped = 11,
    Flattening = 20,
    Flattened = 21,
    Sanitizing = 30,
    Sanitized = 31,
    Resolving = 40,
    Resolved = 41,
    Cleaning = 50,
    Cleaned = 51,
    Finalizing = 60,
    Processed = 61,
}
