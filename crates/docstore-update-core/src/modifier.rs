//! Modifier operations and the leaf nodes that carry them.
//!
//! A [`LeafNode`] wraps exactly one modifier operation together with its
//! apply-time parameters. Modifier-specific validation happens at
//! construction, through the [`ModifierRegistry`], so a compiled tree only
//! ever holds well-formed leaves.

use std::collections::BTreeMap;
use std::fmt;

use docstore_update_model::{Collation, UpdateError, UpdateErrorCode, Value};

/// The closed set of modifier operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[non_exhaustive]
pub enum ModifierKind {
    /// Set the field to a value (`$set`).
    Set,
    /// Remove the field (`$unset`).
    Unset,
    /// Increment a numeric field (`$inc`).
    Inc,
}

impl ModifierKind {
    /// Returns the update-expression keyword for this kind, e.g. `$set`.
    #[must_use]
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::Unset => "$unset",
            Self::Inc => "$inc",
        }
    }

    /// Looks up a kind from its update-expression keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "$set" => Some(Self::Set),
            "$unset" => Some(Self::Unset),
            "$inc" => Some(Self::Inc),
            _ => None,
        }
    }
}

impl fmt::Display for ModifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A validated modifier operation with its apply-time parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifierOp {
    /// Replace the target with the given value.
    Set(Value),
    /// Remove the target; absent targets are a no-op.
    Unset,
    /// Add the given numeric amount to the target.
    Inc(Value),
}

/// A terminal node in the compiled update tree: one modifier at one path.
#[derive(Debug, Clone, PartialEq)]
pub struct LeafNode {
    op: ModifierOp,
}

impl LeafNode {
    /// The modifier kind carried by this leaf.
    #[must_use]
    pub fn kind(&self) -> ModifierKind {
        match self.op {
            ModifierOp::Set(_) => ModifierKind::Set,
            ModifierOp::Unset => ModifierKind::Unset,
            ModifierOp::Inc(_) => ModifierKind::Inc,
        }
    }

    /// Returns `true` if applying this leaf to the given existing value would
    /// leave it unchanged.
    #[must_use]
    pub fn is_noop_for(&self, existing: &Value) -> bool {
        match &self.op {
            ModifierOp::Set(v) => existing == v,
            // An existing target always changes: it gets removed.
            ModifierOp::Unset => false,
            ModifierOp::Inc(amount) => {
                add_numeric(existing, amount).is_ok_and(|r| &r == existing)
            }
        }
    }

    /// Computes the value that applying this leaf to `existing` produces.
    ///
    /// Not meaningful for `Unset`, whose effect is removal rather than
    /// replacement; the applier handles it separately.
    ///
    /// # Errors
    ///
    /// `BadValue` if the existing value cannot accept the operation (e.g.
    /// incrementing a non-numeric value).
    pub fn result_for(&self, existing: &Value) -> Result<Value, UpdateError> {
        match &self.op {
            ModifierOp::Set(v) => Ok(v.clone()),
            ModifierOp::Unset => Ok(Value::Null),
            ModifierOp::Inc(amount) => add_numeric(existing, amount).map_err(|()| {
                UpdateError::new(
                    UpdateErrorCode::BadValue,
                    format!(
                        "Cannot apply $inc to a value of non-numeric type: {}",
                        existing.summary()
                    ),
                )
            }),
        }
    }

    /// The value this leaf materializes when its target does not exist yet,
    /// or `None` if an absent target makes the whole leaf a no-op.
    #[must_use]
    pub fn value_for_create(&self) -> Option<Value> {
        match &self.op {
            ModifierOp::Set(v) => Some(v.clone()),
            // Deleting a field that does not exist is a no-op.
            ModifierOp::Unset => None,
            // A missing target is treated as zero.
            ModifierOp::Inc(amount) => Some(amount.clone()),
        }
    }

    /// Returns `true` if this leaf removes its target instead of writing it.
    #[must_use]
    pub fn is_removal(&self) -> bool {
        matches!(self.op, ModifierOp::Unset)
    }
}

/// Adds two numeric values, staying integral when both sides are integers.
///
/// Integer overflow widens to double rather than wrapping.
fn add_numeric(a: &Value, b: &Value) -> Result<Value, ()> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x
            .checked_add(*y)
            .map_or_else(
                || {
                    #[allow(clippy::cast_precision_loss)]
                    Value::Double(*x as f64 + *y as f64)
                },
                Value::Int,
            )),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => Ok(Value::Double(x + y)),
            _ => Err(()),
        },
    }
}

/// Constructor for one modifier kind: validates the payload and builds the
/// leaf. Collation is forwarded for modifiers that compare values during
/// initialization; none of the built-ins do.
type LeafConstructor = fn(&Value, Option<&Collation>) -> Result<LeafNode, UpdateError>;

/// Explicit, process-initialized table mapping modifier kinds to leaf
/// constructors.
///
/// Passed to the compiler rather than living in module-level state, so tests
/// can register a restricted or extended set in isolation.
#[derive(Debug, Clone)]
pub struct ModifierRegistry {
    constructors: BTreeMap<ModifierKind, LeafConstructor>,
}

impl ModifierRegistry {
    /// An empty registry with no modifiers.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register a constructor for the given kind, replacing any previous one.
    pub fn register(&mut self, kind: ModifierKind, constructor: LeafConstructor) {
        self.constructors.insert(kind, constructor);
    }

    /// Construct and validate a leaf for `kind` from the supplied value.
    ///
    /// # Errors
    ///
    /// `FailedToParse` if the kind is not registered, or if the modifier's
    /// own validation rejects the value.
    pub fn make_leaf(
        &self,
        kind: ModifierKind,
        value: &Value,
        collation: Option<&Collation>,
    ) -> Result<LeafNode, UpdateError> {
        let constructor = self.constructors.get(&kind).ok_or_else(|| {
            UpdateError::new(
                UpdateErrorCode::FailedToParse,
                format!("Cannot construct modifier of type {kind}"),
            )
        })?;
        constructor(value, collation)
    }
}

impl Default for ModifierRegistry {
    /// Registry with all built-in modifiers.
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(ModifierKind::Set, make_set);
        registry.register(ModifierKind::Unset, make_unset);
        registry.register(ModifierKind::Inc, make_inc);
        registry
    }
}

fn make_set(value: &Value, _collation: Option<&Collation>) -> Result<LeafNode, UpdateError> {
    Ok(LeafNode {
        op: ModifierOp::Set(value.clone()),
    })
}

fn make_unset(_value: &Value, _collation: Option<&Collation>) -> Result<LeafNode, UpdateError> {
    // The operand of $unset is ignored; only the path matters.
    Ok(LeafNode {
        op: ModifierOp::Unset,
    })
}

fn make_inc(value: &Value, _collation: Option<&Collation>) -> Result<LeafNode, UpdateError> {
    if !value.is_numeric() {
        return Err(UpdateError::new(
            UpdateErrorCode::FailedToParse,
            format!(
                "Cannot increment with non-numeric argument: {}",
                value.summary()
            ),
        ));
    }
    Ok(LeafNode {
        op: ModifierOp::Inc(value.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ModifierRegistry {
        ModifierRegistry::default()
    }

    #[test]
    fn test_should_construct_set_leaf() {
        let leaf = registry()
            .make_leaf(ModifierKind::Set, &Value::Int(5), None)
            .unwrap();
        assert_eq!(leaf.kind(), ModifierKind::Set);
        assert_eq!(leaf.result_for(&Value::Int(1)).unwrap(), Value::Int(5));
        assert_eq!(leaf.value_for_create(), Some(Value::Int(5)));
    }

    #[test]
    fn test_should_detect_set_noop() {
        let leaf = registry()
            .make_leaf(ModifierKind::Set, &Value::Int(5), None)
            .unwrap();
        assert!(leaf.is_noop_for(&Value::Int(5)));
        assert!(!leaf.is_noop_for(&Value::Int(6)));
        assert!(!leaf.is_noop_for(&Value::Double(5.0)));
    }

    #[test]
    fn test_should_treat_unset_of_missing_target_as_noop() {
        let leaf = registry()
            .make_leaf(ModifierKind::Unset, &Value::Bool(true), None)
            .unwrap();
        assert!(leaf.is_removal());
        assert_eq!(leaf.value_for_create(), None);
        assert!(!leaf.is_noop_for(&Value::Int(1)));
    }

    #[test]
    fn test_should_reject_non_numeric_inc_argument() {
        let err = registry()
            .make_leaf(ModifierKind::Inc, &Value::String("x".to_owned()), None)
            .unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::FailedToParse);
    }

    #[test]
    fn test_should_increment_integers_without_widening() {
        let leaf = registry()
            .make_leaf(ModifierKind::Inc, &Value::Int(2), None)
            .unwrap();
        assert_eq!(leaf.result_for(&Value::Int(3)).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_should_widen_on_integer_overflow() {
        let leaf = registry()
            .make_leaf(ModifierKind::Inc, &Value::Int(1), None)
            .unwrap();
        let result = leaf.result_for(&Value::Int(i64::MAX)).unwrap();
        assert!(matches!(result, Value::Double(_)));
    }

    #[test]
    fn test_should_fail_inc_on_non_numeric_target() {
        let leaf = registry()
            .make_leaf(ModifierKind::Inc, &Value::Int(1), None)
            .unwrap();
        let err = leaf.result_for(&Value::String("x".to_owned())).unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::BadValue);
    }

    #[test]
    fn test_should_detect_inc_by_zero_as_noop() {
        let leaf = registry()
            .make_leaf(ModifierKind::Inc, &Value::Int(0), None)
            .unwrap();
        assert!(leaf.is_noop_for(&Value::Int(7)));
        assert!(!leaf.is_noop_for(&Value::String("x".to_owned())));
    }

    #[test]
    fn test_should_fail_for_unregistered_kind() {
        let err = ModifierRegistry::empty()
            .make_leaf(ModifierKind::Set, &Value::Int(1), None)
            .unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::FailedToParse);
        assert!(err.message.contains("$set"));
    }

    #[test]
    fn test_should_map_keywords() {
        assert_eq!(ModifierKind::from_keyword("$set"), Some(ModifierKind::Set));
        assert_eq!(ModifierKind::from_keyword("$unset"), Some(ModifierKind::Unset));
        assert_eq!(ModifierKind::from_keyword("$inc"), Some(ModifierKind::Inc));
        assert_eq!(ModifierKind::from_keyword("$push"), None);
    }
}
