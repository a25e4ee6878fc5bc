//! Dot-notation field paths.
//!
//! `"email"` addresses a top-level property, `"address.street"` a nested one,
//! and a `[]` suffix expands into every element of an array:
//! `"phones[]"` targets each phone, `"contacts[].email"` each contact's email.

use std::fmt;

/// One step of a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// Navigate into an object property by name.
    Key(String),
    /// Expand into every element of a JSON array.
    ArrayItem,
}

/// A parsed, validated field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    raw: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a dot-notation path.
    ///
    /// Returns `None` if any dot-separated part (ignoring a trailing `[]`) is
    /// empty, e.g. `""`, `"a..b"` or `"[]"`.
    pub fn parse(path: &str) -> Option<Self> {
        let mut segments = Vec::new();
        for part in path.trim().split('.') {
            let (key, is_array) = match part.strip_suffix("[]") {
                Some(key) => (key, true),
                None => (part, false),
            };
            if key.is_empty() || key.contains("[]") {
                return None;
            }
            segments.push(PathSegment::Key(key.to_owned()));
            if is_array {
                segments.push(PathSegment::ArrayItem);
            }
        }
        Some(Self {
            raw: path.trim().to_owned(),
            segments,
        })
    }

    /// Path as written in the policy.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_flat() {
        let p = FieldPath::parse("email").unwrap();
        assert_eq!(p.segments(), &[PathSegment::Key("email".into())]);
    }

    #[test]
    fn parse_nested() {
        let p = FieldPath::parse("address.street").unwrap();
        assert_eq!(p.segments().len(), 2);
        assert_eq!(p.to_string(), "address.street");
    }

    #[test]
    fn parse_array() {
        let p = FieldPath::parse("contacts[].email").unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Key("contacts".into()),
                PathSegment::ArrayItem,
                PathSegment::Key("email".into()),
            ]
        );
        let leaf = FieldPath::parse("phones[]").unwrap();
        assert!(matches!(leaf.segments()[1], PathSegment::ArrayItem));
    }

    #[test]
    fn parse_rejects_empty_parts() {
        for bad in ["", "a..b", ".a", "[]", "a.[]", "a[][]"] {
            assert!(FieldPath::parse(bad).is_none(), "{bad:?} should be rejected");
        }
    }
}
