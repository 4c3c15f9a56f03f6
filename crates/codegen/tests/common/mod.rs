//! Shared builders for the pipeline tests.

#![allow(dead_code)]

use schemagen_codegen::{Attr, AttrType, Class, DataType, Extension, Tag};

pub const LOCATION: &str = "schemas/books.xsd";

/// Route pipeline logs to the test output, filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn class(qname: &str, tag: Tag, attrs: Vec<Attr>) -> Class {
    let mut class = Class::new(qname, tag, LOCATION);
    class.namespace = schemagen_codegen::namespaces::target_namespace(qname).map(str::to_string);
    class.attrs = attrs;
    class
}

pub fn element(qname: &str, attrs: Vec<Attr>) -> Class {
    class(qname, Tag::Element, attrs)
}

pub fn complex_type(qname: &str, attrs: Vec<Attr>) -> Class {
    class(qname, Tag::ComplexType, attrs)
}

pub fn child(name: &str, qname: &str) -> Attr {
    Attr::new(Tag::Element, name, AttrType::new(qname))
}

pub fn text(tag: Tag, name: &str, datatype: DataType) -> Attr {
    Attr::new(tag, name, AttrType::native(datatype))
}

pub fn extends(qname: &str) -> Extension {
    Extension::new(Tag::Extension, AttrType::new(qname))
}

pub fn names(class: &Class) -> Vec<&str> {
    class.attrs.iter().map(Attr::field_name).collect()
}
