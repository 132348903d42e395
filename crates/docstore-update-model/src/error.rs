//! Structured errors for the update engine.
//!
//! Every failure carries a stable code, a human-readable message, and (when
//! known) the dotted path at which the failure occurred. Callers dispatch on
//! the code; the message and path are diagnostics and must never be the only
//! record of what went wrong.

use std::fmt;

/// Stable error codes expected by callers of the update engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum UpdateErrorCode {
    /// An update path is empty or contains an empty segment.
    EmptyFieldName,
    /// Malformed positional usage, or a positional element left unresolved at
    /// apply time.
    BadValue,
    /// A modifier could not be constructed from its supplied value.
    FailedToParse,
    /// Two modifier paths alias each other, at compile time or merge time.
    ConflictingUpdateOperators,
    /// Existing document structure blocks path creation.
    PathNotViable,
}

impl UpdateErrorCode {
    /// Returns the short code string.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EmptyFieldName => "EmptyFieldName",
            Self::BadValue => "BadValue",
            Self::FailedToParse => "FailedToParse",
            Self::ConflictingUpdateOperators => "ConflictingUpdateOperators",
            Self::PathNotViable => "PathNotViable",
        }
    }
}

impl fmt::Display for UpdateErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An update engine error: code, message, and the offending dotted path.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub struct UpdateError {
    /// The stable error code.
    pub code: UpdateErrorCode,
    /// A human-readable error message.
    pub message: String,
    /// The dotted path at which the error occurred, if known.
    pub path: Option<String>,
}

impl fmt::Display for UpdateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl UpdateError {
    /// Create a new error with the given code and message.
    #[must_use]
    pub fn new(code: UpdateErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    /// Attach the offending dotted path.
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// An `EmptyFieldName` error for the given path.
    #[must_use]
    pub fn empty_field_name(path: &str) -> Self {
        Self::new(
            UpdateErrorCode::EmptyFieldName,
            format!("The update path '{path}' contains an empty field name, which is not allowed"),
        )
        .with_path(path)
    }

    /// A merge-time `ConflictingUpdateOperators` error at the given dotted
    /// path.
    #[must_use]
    pub fn merge_conflict(path: &str) -> Self {
        Self::new(
            UpdateErrorCode::ConflictingUpdateOperators,
            format!("Update created a conflict at '{path}'"),
        )
        .with_path(path)
    }

    /// A `ConflictingUpdateOperators` error citing the full update path and
    /// the conflict point within it.
    #[must_use]
    pub fn conflict(full_path: &str, conflict_at: &str) -> Self {
        Self::new(
            UpdateErrorCode::ConflictingUpdateOperators,
            format!("Updating the path '{full_path}' would create a conflict at '{conflict_at}'"),
        )
        .with_path(conflict_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_render_code_and_message() {
        let err = UpdateError::new(UpdateErrorCode::BadValue, "Too many positional elements");
        assert_eq!(err.to_string(), "BadValue: Too many positional elements");
        assert!(err.path.is_none());
    }

    #[test]
    fn test_should_carry_conflict_path() {
        let err = UpdateError::conflict("a.b.c", "a.b");
        assert_eq!(err.code, UpdateErrorCode::ConflictingUpdateOperators);
        assert_eq!(err.path.as_deref(), Some("a.b"));
        assert!(err.message.contains("'a.b.c'"));
        assert!(err.message.contains("conflict at 'a.b'"));
    }
}
