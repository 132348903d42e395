//! Collation specification.
//!
//! Collation influences how some modifiers compare values during
//! initialization (for example sort-aware array modifiers). The tree engine
//! itself never inspects it: structural traversal order is always
//! lexicographic by field name regardless of collation.

/// A collation specification passed through to modifier construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collation {
    /// ICU locale tag, e.g. `en_US`. `simple` means binary comparison.
    pub locale: String,
    /// Whether comparisons ignore case.
    pub case_insensitive: bool,
}

impl Collation {
    /// The `simple` binary collation.
    #[must_use]
    pub fn simple() -> Self {
        Self {
            locale: "simple".to_owned(),
            case_insensitive: false,
        }
    }
}

impl Default for Collation {
    fn default() -> Self {
        Self::simple()
    }
}
