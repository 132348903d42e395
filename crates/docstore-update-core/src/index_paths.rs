//! Deciding whether an update path can affect a secondary index.
//!
//! The applier asks this question for every effective mutation; the answer
//! only has to be conservative. A path affects an index if, after dropping
//! numeric segments from the update path (array positions are invisible to
//! index keys), either path is a segment-prefix of the other.

/// Answers "could a mutation at this dotted path affect an index?".
pub trait IndexPathOracle {
    /// `path` is a fully-resolved dotted path: no positional segments.
    fn touches(&self, path: &str) -> bool;
}

/// A set of indexed field paths.
#[derive(Debug, Clone, Default)]
pub struct IndexPathSet {
    paths: Vec<Vec<String>>,
    all_paths_indexed: bool,
}

impl IndexPathSet {
    /// An empty set, affecting nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one indexed dotted path, e.g. `a.b`.
    pub fn add_path(&mut self, path: &str) {
        self.paths
            .push(path.split('.').map(str::to_owned).collect());
    }

    /// Mark every path as potentially indexed. Used when index metadata is
    /// unavailable and correctness requires assuming the worst.
    pub fn set_all_paths_indexed(&mut self) {
        self.all_paths_indexed = true;
    }

    /// The update path with array-position segments removed. An update at
    /// `a.0.b` affects an index on `a.b`.
    fn canonical_segments(path: &str) -> Vec<&str> {
        path.split('.')
            .filter(|seg| !seg.bytes().all(|b| b.is_ascii_digit()))
            .collect()
    }

    fn is_prefix_either_way(indexed: &[String], updated: &[&str]) -> bool {
        indexed
            .iter()
            .zip(updated.iter())
            .all(|(a, b)| a == b)
    }
}

impl IndexPathOracle for IndexPathSet {
    fn touches(&self, path: &str) -> bool {
        if self.all_paths_indexed {
            return true;
        }
        let updated = Self::canonical_segments(path);
        self.paths
            .iter()
            .any(|indexed| Self::is_prefix_either_way(indexed, &updated))
    }
}

/// The oracle used by update paths that never touch indexes, e.g. in tests
/// or standalone replays.
impl IndexPathOracle for () {
    fn touches(&self, _path: &str) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(paths: &[&str]) -> IndexPathSet {
        let mut s = IndexPathSet::new();
        for p in paths {
            s.add_path(p);
        }
        s
    }

    #[test]
    fn test_should_match_exact_path() {
        assert!(set(&["a.b"]).touches("a.b"));
        assert!(!set(&["a.b"]).touches("a.c"));
    }

    #[test]
    fn test_should_match_prefix_in_either_direction() {
        // Updating a whole subtree can rewrite indexed fields below it, and
        // updating below an indexed path rewrites part of its key.
        assert!(set(&["a.b.c"]).touches("a"));
        assert!(set(&["a"]).touches("a.b.c"));
    }

    #[test]
    fn test_should_ignore_numeric_segments_in_update_path() {
        assert!(set(&["a.b"]).touches("a.0.b"));
        assert!(set(&["a.b"]).touches("a.10.b.2"));
        assert!(!set(&["a.b"]).touches("a.0.c"));
    }

    #[test]
    fn test_should_not_match_string_prefixes() {
        assert!(!set(&["ab"]).touches("a"));
        assert!(!set(&["a"]).touches("ab"));
    }

    #[test]
    fn test_should_report_nothing_for_empty_set() {
        assert!(!set(&[]).touches("a"));
        assert!(!().touches("a"));
    }

    #[test]
    fn test_should_report_everything_when_all_paths_indexed() {
        let mut s = set(&[]);
        s.set_all_paths_indexed();
        assert!(s.touches("anything.at.all"));
    }
}
