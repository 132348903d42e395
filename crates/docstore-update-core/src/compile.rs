//! Compiling one (modifier, path, value) triple into the update tree.
//!
//! Client code calls [`parse_and_merge`] once per modifier expression to
//! build up a single root [`ObjectNode`] describing an entire update request.
//! Path aliasing across modifiers is rejected here, at compile time, so an
//! accepted tree can never clobber one field with two different values.

use docstore_update_model::{Collation, UpdateError, Value};
use tracing::trace;

use crate::modifier::{ModifierKind, ModifierRegistry};
use crate::node::{ObjectNode, UpdateNode};
use crate::path::FieldPath;

/// Lex `path`, extend the tree from `root` and install a leaf for `kind`.
///
/// Returns whether the path contained a positional segment; the caller uses
/// this to decide whether a matched-array-index must be supplied at apply
/// time.
///
/// # Errors
///
/// - `EmptyFieldName` / `BadValue` for a malformed path (see
///   [`FieldPath::parse`]).
/// - `FailedToParse` if the leaf cannot be constructed from `value`;
///   modifier-specific validation failures propagate unchanged.
/// - `ConflictingUpdateOperators` if the path aliases an already-compiled
///   path, citing the dotted conflict point. On error the tree must be
///   discarded; it may hold a partially-created branch.
pub fn parse_and_merge(
    root: &mut ObjectNode,
    kind: ModifierKind,
    path: &str,
    value: &Value,
    registry: &ModifierRegistry,
    collation: Option<&Collation>,
) -> Result<bool, UpdateError> {
    let (field_path, has_positional) = FieldPath::parse(path)?;

    // Construct and validate the leaf before touching the tree.
    let leaf = registry.make_leaf(kind, value, collation)?;

    let dotted = field_path.dotted();
    let segments = field_path.segments();
    let mut current = root;
    for (i, segment) in segments[..segments.len() - 1].iter().enumerate() {
        let name = segment.as_str();
        if current.get_child(name).is_none() {
            current.set_child(name, UpdateNode::Object(ObjectNode::new()));
        }
        current = match current.get_child_mut(name) {
            Some(UpdateNode::Object(obj)) => obj,
            // An existing leaf makes this path a prefix of another leaf.
            _ => {
                return Err(UpdateError::conflict(
                    &dotted,
                    &field_path.dotted_prefix(i + 1),
                ));
            }
        };
    }

    // The terminal segment must be vacant: an existing leaf is an exact
    // duplicate, an existing object already compiles paths through here.
    let last = segments[segments.len() - 1].as_str();
    if current.get_child(last).is_some() {
        return Err(UpdateError::conflict(&dotted, &dotted));
    }
    current.set_child(last, UpdateNode::Leaf(leaf));

    trace!(path = %dotted, kind = %kind, has_positional, "compiled update path");
    Ok(has_positional)
}
