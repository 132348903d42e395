//! Applying a compiled update tree to a concrete document.
//!
//! Application is a deterministic, ordered, depth-first walk: at every level
//! children apply in ascending lexicographic order of their (resolved) names,
//! so the mutation and its replication log are stable across runs. The
//! compiled tree is never mutated; subtrees produced by resolving the
//! positional child against a literal index are merged on the fly and
//! discarded once applied.

use std::fmt;

use docstore_update_model::{UpdateError, UpdateErrorCode, Value};
use tracing::{debug, trace};

use crate::index_paths::IndexPathOracle;
use crate::log::LogBuilder;
use crate::merge::merge_update_nodes;
use crate::modifier::LeafNode;
use crate::node::{ObjectNode, UpdateNode};
use crate::path::{FieldPath, PathSegment};

/// The outcome of one `apply` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyResult {
    /// Whether any effective mutation touched a path covered by the index
    /// oracle.
    pub indexes_affected: bool,
    /// `true` iff no leaf anywhere produced a mutation.
    pub noop: bool,
    /// Whether the whole update could mutate existing storage in place.
    /// Lost as soon as any path creation occurs anywhere in the apply.
    pub in_place: bool,
}

/// Applies a compiled tree to documents.
///
/// One `Applier` holds the per-request parameters (matched array index,
/// replication mode, index oracle); each [`Applier::apply`] call owns its own
/// scratch state, so a single compiled tree may be applied from many threads
/// concurrently as long as each document is exclusively owned by its caller.
pub struct Applier<'a> {
    matched_field: Option<&'a str>,
    from_replication: bool,
    index_paths: &'a dyn IndexPathOracle,
}

impl fmt::Debug for Applier<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Applier")
            .field("matched_field", &self.matched_field)
            .field("from_replication", &self.from_replication)
            .finish_non_exhaustive()
    }
}

/// Scratch state for a single `apply` call.
struct ApplyState<'a> {
    /// Segments already descended through existing document structure.
    path_taken: FieldPath,
    /// Segments not yet materialized in the document.
    path_to_create: FieldPath,
    log: &'a mut LogBuilder,
    indexes_affected: bool,
    noop: bool,
    created_any: bool,
}

impl<'a> Applier<'a> {
    /// Create an applier.
    ///
    /// `matched_field` is the concrete array index (as a string) the query
    /// matcher resolved for the positional operator; an empty string counts
    /// as absent.
    #[must_use]
    pub fn new(
        matched_field: Option<&'a str>,
        from_replication: bool,
        index_paths: &'a dyn IndexPathOracle,
    ) -> Self {
        Self {
            matched_field: matched_field.filter(|m| !m.is_empty()),
            from_replication,
            index_paths,
        }
    }

    /// Apply `root` to `doc`, appending effective changes to `log`.
    ///
    /// On success the document holds exactly the described mutation; on error
    /// the document may hold a partial mutation and must be discarded by the
    /// caller.
    ///
    /// # Errors
    ///
    /// - `BadValue` if the tree has a positional child but no matched field
    ///   was supplied.
    /// - `ConflictingUpdateOperators` if the resolved positional subtree
    ///   conflicts with a literal-index subtree, citing the resolved path.
    /// - `PathNotViable` if existing structure blocks path creation and this
    ///   is not a replicated update.
    pub fn apply(
        &self,
        root: &ObjectNode,
        doc: &mut Value,
        log: &mut LogBuilder,
    ) -> Result<ApplyResult, UpdateError> {
        let mut state = ApplyState {
            path_taken: FieldPath::new(),
            path_to_create: FieldPath::new(),
            log,
            indexes_affected: false,
            noop: true,
            created_any: false,
        };
        self.apply_object(root, doc, &mut state)?;
        let result = ApplyResult {
            indexes_affected: state.indexes_affected,
            noop: state.noop,
            in_place: !state.created_any,
        };
        trace!(
            noop = result.noop,
            indexes_affected = result.indexes_affected,
            "applied update tree"
        );
        Ok(result)
    }

    /// Apply an internal node: resolve the positional child, then apply the
    /// effective children in ascending lexicographic order of resolved name.
    fn apply_object(
        &self,
        node: &ObjectNode,
        element: &mut Value,
        state: &mut ApplyState<'_>,
    ) -> Result<(), UpdateError> {
        let mut pending_positional = node.positional_child();
        let matched = if pending_positional.is_some() {
            Some(self.matched_field.ok_or_else(|| {
                UpdateError::new(
                    UpdateErrorCode::BadValue,
                    "The positional operator did not find the match needed from the query.",
                )
            })?)
        } else {
            None
        };

        for (name, child) in node.children() {
            if let (Some(positional), Some(key)) = (pending_positional, matched) {
                if key == name.as_str() {
                    // The positional child resolves to the same key as a
                    // literal child: they must be merged and applied as one.
                    let merged = resolve_positional(positional, child, key, state)?;
                    self.apply_child(&merged, key, element, state)?;
                    pending_positional = None;
                    continue;
                }
                if key < name.as_str() {
                    // The resolved key sorts before this child, so the
                    // positional child applies now to keep the order.
                    self.apply_child(positional, key, element, state)?;
                    pending_positional = None;
                }
            }
            self.apply_child(child, name, element, state)?;
        }

        // The resolved key sorts after all literal children.
        if let (Some(positional), Some(key)) = (pending_positional, matched) {
            self.apply_child(positional, key, element, state)?;
        }

        Ok(())
    }

    /// Apply one effective child under `name`, descending into existing
    /// document structure or extending the path-to-create accumulator.
    fn apply_child(
        &self,
        child: &UpdateNode,
        name: &str,
        element: &mut Value,
        state: &mut ApplyState<'_>,
    ) -> Result<(), UpdateError> {
        match child {
            UpdateNode::Leaf(leaf) => self.apply_leaf(leaf, name, element, state),
            UpdateNode::Object(node) => {
                if state.path_to_create.is_empty() && element.has_child(name) {
                    state.path_taken.push(name);
                    let result = element
                        .get_child_mut(name)
                        .map_or(Ok(()), |child_element| {
                            self.apply_object(node, child_element, state)
                        });
                    state.path_taken.pop();
                    result
                } else {
                    state.path_to_create.push(name);
                    let result = self.apply_object(node, element, state);
                    state.path_to_create.pop();
                    result
                }
            }
        }
    }

    fn apply_leaf(
        &self,
        leaf: &LeafNode,
        name: &str,
        element: &mut Value,
        state: &mut ApplyState<'_>,
    ) -> Result<(), UpdateError> {
        if state.path_to_create.is_empty() && element.has_child(name) {
            state.path_taken.push(name);
            let result = self.apply_leaf_to_existing(leaf, name, element, state);
            state.path_taken.pop();
            result
        } else {
            state.path_to_create.push(name);
            let result = self.apply_leaf_by_creating(leaf, element, state);
            state.path_to_create.pop();
            result
        }
    }

    /// The leaf's target exists: check for a no-op, then mutate in place or
    /// remove. `state.path_taken` already ends with the target's name.
    fn apply_leaf_to_existing(
        &self,
        leaf: &LeafNode,
        name: &str,
        element: &mut Value,
        state: &mut ApplyState<'_>,
    ) -> Result<(), UpdateError> {
        let full_path = state.path_taken.dotted();
        let Some(existing) = element.get_child(name) else {
            return Ok(());
        };

        if leaf.is_noop_for(existing) {
            // No mutation, no log entry, no index impact.
            return Ok(());
        }

        if leaf.is_removal() {
            element.remove_child(name);
            state.log.append(&full_path, leaf.kind(), Value::Bool(true));
        } else {
            let new_value = leaf
                .result_for(existing)
                .map_err(|e| e.with_path(full_path.clone()))?;
            if let Some(slot) = element.get_child_mut(name) {
                *slot = new_value.clone();
            }
            state.log.append(&full_path, leaf.kind(), new_value);
        }

        state.noop = false;
        if self.index_paths.touches(&full_path) {
            state.indexes_affected = true;
        }
        Ok(())
    }

    /// The leaf's target does not exist: materialize the remaining path as
    /// nested objects under the deepest existing element, unless that element
    /// blocks creation. `state.path_to_create` ends with the target's name.
    fn apply_leaf_by_creating(
        &self,
        leaf: &LeafNode,
        element: &mut Value,
        state: &mut ApplyState<'_>,
    ) -> Result<(), UpdateError> {
        let Some(new_value) = leaf.value_for_create() else {
            // Deleting a field that does not exist is a no-op.
            return Ok(());
        };

        let full_path = state.path_taken.dotted_with(&state.path_to_create);
        if create_path(element, state.path_to_create.segments(), new_value.clone()).is_err() {
            if self.from_replication {
                // Replicated updates are best-effort per field: any other
                // modifiers in this request must still be applied, so this
                // subtree is skipped rather than failing the whole apply.
                debug!(path = %full_path, "skipping non-viable path in replicated update");
                return Ok(());
            }
            return Err(path_not_viable(element, state));
        }

        state.created_any = true;
        state.noop = false;
        if self.index_paths.touches(&full_path) {
            state.indexes_affected = true;
        }
        state.log.append(&full_path, leaf.kind(), new_value);
        Ok(())
    }

}

/// Merge the positional subtree with the literal subtree it resolved onto.
///
/// Each tree position is applied exactly once per call, so the merged
/// subtree is computed on demand and owned by the caller; the compiled tree
/// itself stays untouched.
fn resolve_positional(
    positional: &UpdateNode,
    literal: &UpdateNode,
    key: &str,
    state: &ApplyState<'_>,
) -> Result<UpdateNode, UpdateError> {
    // The full resolved path is required for conflict reporting, e.g. a
    // merge failure at `a.0` rather than `a.$`.
    let mut merge_path = state.path_taken.clone();
    for segment in state.path_to_create.segments() {
        merge_path.push(segment.as_str());
    }
    merge_path.push(key);
    merge_update_nodes(positional, literal, &mut merge_path)
}

/// A `PathNotViable` error naming the first uncreatable field and the
/// blocking element.
fn path_not_viable(element: &Value, state: &ApplyState<'_>) -> UpdateError {
    let field = state
        .path_to_create
        .segments()
        .first()
        .map_or(String::new(), |s| s.as_str().to_owned());
    let blocker = match state.path_taken.segments().last() {
        Some(seg) => format!("{{{}: {}}}", seg.as_str(), element.summary()),
        None => element.summary(),
    };
    UpdateError::new(
        UpdateErrorCode::PathNotViable,
        format!("Cannot create field '{field}' in element {blocker}"),
    )
    .with_path(state.path_taken.dotted())
}

/// Materialize `segments` under `element`, installing `value` at the end.
///
/// The first segment may index into an existing array (padding with nulls
/// past the end); every deeper segment creates a nested object. Fails if
/// `element` is a scalar or an array segment is not numeric.
fn create_path(
    element: &mut Value,
    segments: &[PathSegment],
    value: Value,
) -> Result<(), ()> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(());
    };
    if element.is_scalar() {
        return Err(());
    }

    let name = first.as_str();
    if rest.is_empty() {
        element.create_child(name, value).map(|_| ()).ok_or(())
    } else {
        let child = element
            .create_child(name, Value::empty_object())
            .ok_or(())?;
        create_path(child, rest, value)
    }
}
