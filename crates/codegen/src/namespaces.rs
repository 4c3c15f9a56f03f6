//! Clark notation helpers.
//!
//! Qualified names are carried around as `{namespace}local` strings. A name without braces has
//! no namespace.

pub const XML_SCHEMA: &str = "http://www.w3.org/2001/XMLSchema";
pub const XML_SCHEMA_INSTANCE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Wildcard namespace constraint meaning "any namespace".
pub const ANY_NAMESPACE: &str = "##any";

/// Parse Clark notation into namespace and local name.
///
/// `{http://example.com/ns}localName` yields `(Some("http://example.com/ns"), "localName")`,
/// anything else is returned as-is with no namespace.
pub fn split_qname(qname: &str) -> (Option<&str>, &str) {
    if let Some(rest) = qname.strip_prefix('{') {
        if let Some(end) = rest.find('}') {
            let namespace = &rest[..end];
            let local = &rest[end + 1..];
            return ((!namespace.is_empty()).then_some(namespace), local);
        }
    }
    (None, qname)
}

pub fn build_qname(namespace: Option<&str>, local: &str) -> String {
    match namespace {
        Some(ns) if !ns.is_empty() => format!("{{{ns}}}{local}"),
        _ => local.to_string(),
    }
}

pub fn local_name(qname: &str) -> &str {
    split_qname(qname).1
}

pub fn target_namespace(qname: &str) -> Option<&str> {
    split_qname(qname).0
}

/// Turn a namespace URI into a list of identifier-friendly segments.
///
/// The scheme, `www.` prefix, file extensions and empty segments are dropped, and
/// `urn:` style namespaces are split on colons.
pub fn uri_segments(uri: &str) -> Vec<String> {
    let without_scheme = match uri.find("://") {
        Some(pos) => &uri[pos + 3..],
        None => uri.strip_prefix("urn:").unwrap_or(uri),
    };
    let without_www = without_scheme.strip_prefix("www.").unwrap_or(without_scheme);

    without_www
        .split(['/', ':', '#'])
        .map(|segment| match segment.rsplit_once('.') {
            Some((stem, ext)) if matches!(ext, "xsd" | "wsdl" | "xml" | "dtd" | "json") => stem,
            _ => segment,
        })
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qname() {
        assert_eq!(split_qname("{urn:a}b"), (Some("urn:a"), "b"));
        assert_eq!(split_qname("b"), (None, "b"));
        assert_eq!(split_qname("{}b"), (None, "b"));
    }

    #[test]
    fn test_build_qname() {
        assert_eq!(build_qname(Some("urn:a"), "b"), "{urn:a}b");
        assert_eq!(build_qname(None, "b"), "b");
        assert_eq!(build_qname(Some(""), "b"), "b");
    }

    #[test]
    fn test_uri_segments() {
        assert_eq!(
            uri_segments("http://www.example.com/schemas/books.xsd"),
            vec!["example.com", "schemas", "books"]
        );
        assert_eq!(uri_segments("urn:books:v1"), vec!["books", "v1"]);
    }
}
