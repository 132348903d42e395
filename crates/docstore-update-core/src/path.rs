//! Dotted update paths.
//!
//! A path is an ordered sequence of segments separated by `.`. Each segment is
//! either a field name or the single reserved positional marker `$`, which
//! stands for whichever array index matched the query filter and is resolved
//! only at apply time.

use std::fmt;

use docstore_update_model::{UpdateError, UpdateErrorCode};

/// The reserved positional marker segment.
pub const POSITIONAL: &str = "$";

/// One segment of a dotted update path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A literal field name (which may be numeric, denoting an array index).
    Field(String),
    /// The positional marker `$`.
    Positional,
}

impl PathSegment {
    /// Returns the segment as it appears in a dotted path.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Field(name) => name,
            Self::Positional => POSITIONAL,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ordered sequence of path segments.
///
/// Also used as a scratch accumulator during apply: the engine pushes a
/// segment before descending and pops it on the way back out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// An empty path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lex and validate a dotted path string.
    ///
    /// Returns the path together with a flag indicating whether it contains
    /// the positional marker.
    ///
    /// # Errors
    ///
    /// - `EmptyFieldName` if the path is empty or any segment is empty
    ///   (including leading/trailing separators).
    /// - `BadValue` if the positional marker appears first, or more than once.
    pub fn parse(path: &str) -> Result<(Self, bool), UpdateError> {
        if path.is_empty() {
            return Err(UpdateError::empty_field_name(path));
        }

        let mut segments = Vec::new();
        let mut positional_count = 0usize;
        for (i, part) in path.split('.').enumerate() {
            if part.is_empty() {
                return Err(UpdateError::empty_field_name(path));
            }
            if part == POSITIONAL {
                if i == 0 {
                    return Err(UpdateError::new(
                        UpdateErrorCode::BadValue,
                        format!(
                            "Cannot have positional (i.e. '$') element in the first position in path '{path}'"
                        ),
                    )
                    .with_path(path));
                }
                positional_count += 1;
                if positional_count > 1 {
                    return Err(UpdateError::new(
                        UpdateErrorCode::BadValue,
                        format!("Too many positional (i.e. '$') elements found in path '{path}'"),
                    )
                    .with_path(path));
                }
                segments.push(PathSegment::Positional);
            } else {
                segments.push(PathSegment::Field(part.to_owned()));
            }
        }

        Ok((Self { segments }, positional_count > 0))
    }

    /// Returns the segments in order.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the path has no segments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a literal field segment.
    pub fn push(&mut self, name: &str) {
        self.segments.push(PathSegment::Field(name.to_owned()));
    }

    /// Remove and return the last segment.
    pub fn pop(&mut self) -> Option<PathSegment> {
        self.segments.pop()
    }

    /// Renders the dotted form, e.g. `a.$.b`.
    #[must_use]
    pub fn dotted(&self) -> String {
        self.to_string()
    }

    /// Renders the dotted form of the first `n` segments.
    #[must_use]
    pub fn dotted_prefix(&self, n: usize) -> String {
        let mut out = String::new();
        for (i, seg) in self.segments.iter().take(n).enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(seg.as_str());
        }
        out
    }

    /// Renders this path extended by `tail` without mutating either, for
    /// error messages and log paths.
    #[must_use]
    pub fn dotted_with(&self, tail: &FieldPath) -> String {
        match (self.is_empty(), tail.is_empty()) {
            (true, _) => tail.dotted(),
            (_, true) => self.dotted(),
            _ => format!("{}.{}", self.dotted(), tail.dotted()),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_parse_simple_path() {
        let (path, positional) = FieldPath::parse("a.b.c").unwrap();
        assert_eq!(path.len(), 3);
        assert!(!positional);
        assert_eq!(path.dotted(), "a.b.c");
    }

    #[test]
    fn test_should_parse_positional_path() {
        let (path, positional) = FieldPath::parse("a.$.b").unwrap();
        assert!(positional);
        assert_eq!(path.segments()[1], PathSegment::Positional);
        assert_eq!(path.dotted(), "a.$.b");
    }

    #[test]
    fn test_should_keep_numeric_segments_as_fields() {
        let (path, positional) = FieldPath::parse("a.0.b").unwrap();
        assert!(!positional);
        assert_eq!(path.segments()[1], PathSegment::Field("0".to_owned()));
    }

    #[test]
    fn test_should_reject_empty_path() {
        let err = FieldPath::parse("").unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::EmptyFieldName);
    }

    #[test]
    fn test_should_reject_empty_segments() {
        for bad in ["a.", ".a", "a..b"] {
            let err = FieldPath::parse(bad).unwrap_err();
            assert_eq!(err.code, UpdateErrorCode::EmptyFieldName, "path {bad:?}");
        }
    }

    #[test]
    fn test_should_reject_positional_first() {
        let err = FieldPath::parse("$.a").unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::BadValue);
        assert!(err.message.contains("first position"));

        let err = FieldPath::parse("$").unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::BadValue);
    }

    #[test]
    fn test_should_reject_multiple_positionals() {
        let err = FieldPath::parse("a.$.b.$").unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::BadValue);
        assert!(err.message.contains("Too many positional"));
    }

    #[test]
    fn test_should_allow_dollar_prefixed_field_names() {
        // Only the bare "$" segment is positional; "$id" is a plain field.
        let (path, positional) = FieldPath::parse("a.$id").unwrap();
        assert!(!positional);
        assert_eq!(path.segments()[1], PathSegment::Field("$id".to_owned()));
    }

    #[test]
    fn test_should_render_joined_paths() {
        let (taken, _) = FieldPath::parse("a.b").unwrap();
        let (to_create, _) = FieldPath::parse("c.d").unwrap();
        assert_eq!(taken.dotted_with(&to_create), "a.b.c.d");
        assert_eq!(taken.dotted_with(&FieldPath::new()), "a.b");
        assert_eq!(FieldPath::new().dotted_with(&to_create), "c.d");
    }

    #[test]
    fn test_should_push_and_pop_segments() {
        let mut path = FieldPath::new();
        path.push("a");
        path.push("0");
        assert_eq!(path.dotted(), "a.0");
        assert_eq!(path.pop(), Some(PathSegment::Field("0".to_owned())));
        assert_eq!(path.dotted(), "a");
    }

    #[test]
    fn test_should_render_prefix() {
        let (path, _) = FieldPath::parse("a.b.c").unwrap();
        assert_eq!(path.dotted_prefix(2), "a.b");
        assert_eq!(path.dotted_prefix(0), "");
    }
}
