//! Building the replication log for an applied update.
//!
//! The log is an update expression itself, replayable through the same
//! engine: every effective mutation is recorded as a `$set` of the final
//! value (increments are logged post-arithmetic, so replay is idempotent)
//! and every effective removal as a `$unset`. Entries keep the order in
//! which mutations were applied.

use docstore_update_model::Value;
use indexmap::IndexMap;

use crate::modifier::ModifierKind;

/// Accumulates effective changes during one apply call.
#[derive(Debug, Default)]
pub struct LogBuilder {
    sets: IndexMap<String, Value>,
    unsets: IndexMap<String, Value>,
}

impl LogBuilder {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one effective change at the fully-resolved dotted `path`.
    ///
    /// For `Set` and `Inc`, `value` is the value now present in the document;
    /// for `Unset`, `value` is ignored.
    pub fn append(&mut self, path: &str, kind: ModifierKind, value: Value) {
        match kind {
            ModifierKind::Set | ModifierKind::Inc => {
                self.sets.insert(path.to_owned(), value);
            }
            ModifierKind::Unset => {
                self.unsets.insert(path.to_owned(), Value::Bool(true));
            }
        }
    }

    /// Returns `true` if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty() && self.unsets.is_empty()
    }

    /// Render the log as a replayable update document, e.g.
    /// `{"$set": {"a.b": 5}, "$unset": {"c": true}}`. An apply with no
    /// effective changes yields an empty document.
    #[must_use]
    pub fn into_document(self) -> Value {
        let mut document = IndexMap::new();
        if !self.sets.is_empty() {
            document.insert(
                ModifierKind::Set.keyword().to_owned(),
                Value::Object(self.sets),
            );
        }
        if !self.unsets.is_empty() {
            document.insert(
                ModifierKind::Unset.keyword().to_owned(),
                Value::Object(self.unsets),
            );
        }
        Value::Object(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> Value {
        v.into()
    }

    #[test]
    fn test_should_render_empty_log_as_empty_document() {
        let log = LogBuilder::new();
        assert!(log.is_empty());
        assert_eq!(log.into_document(), doc(json!({})));
    }

    #[test]
    fn test_should_group_entries_by_section() {
        let mut log = LogBuilder::new();
        log.append("a.b", ModifierKind::Set, Value::Int(5));
        log.append("c", ModifierKind::Unset, Value::Bool(true));
        log.append("d", ModifierKind::Inc, Value::Int(7));
        assert_eq!(
            log.into_document(),
            doc(json!({"$set": {"a.b": 5, "d": 7}, "$unset": {"c": true}}))
        );
    }

    #[test]
    fn test_should_omit_empty_sections() {
        let mut log = LogBuilder::new();
        log.append("a", ModifierKind::Unset, Value::Bool(true));
        assert_eq!(log.into_document(), doc(json!({"$unset": {"a": true}})));
    }

    #[test]
    fn test_should_preserve_append_order() {
        let mut log = LogBuilder::new();
        log.append("z", ModifierKind::Set, Value::Int(1));
        log.append("a", ModifierKind::Set, Value::Int(2));
        let document = log.into_document();
        let keys: Vec<_> = document
            .get_child("$set")
            .unwrap()
            .as_object()
            .unwrap()
            .keys()
            .cloned()
            .collect();
        assert_eq!(keys, vec!["z", "a"]);
    }
}
