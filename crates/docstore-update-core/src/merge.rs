//! Merging two compiled update trees.
//!
//! Two independently-compiled trees are thought of as applying at the same
//! conceptual position. Merging unions their children, recursing on names
//! present in both; any leaf meeting anything at the same position is a
//! conflict. The compiler uses this to reconcile update trees built for
//! different array candidates, and the applier uses it to reconcile a `$`
//! subtree with a literal-index subtree once the matched index is known.

use docstore_update_model::UpdateError;

use crate::node::{ObjectNode, UpdateNode};
use crate::path::{FieldPath, POSITIONAL};

/// Merge two update trees applying at the position named by `path_so_far`.
///
/// `path_so_far` is extended and restored around each recursion; on failure
/// it has been restored to its incoming state and the error cites the
/// deepest conflicting path.
///
/// # Errors
///
/// `ConflictingUpdateOperators` if either node is a leaf, naming
/// `path_so_far`; the first recursive failure aborts the whole merge.
pub fn merge_update_nodes(
    left: &UpdateNode,
    right: &UpdateNode,
    path_so_far: &mut FieldPath,
) -> Result<UpdateNode, UpdateError> {
    match (left, right) {
        (UpdateNode::Object(left_obj), UpdateNode::Object(right_obj)) => {
            merge_object_nodes(left_obj, right_obj, path_so_far).map(UpdateNode::Object)
        }
        _ => Err(UpdateError::merge_conflict(&path_so_far.dotted())),
    }
}

/// Object-on-object merge: children present on one side are cloned, children
/// present on both are merged recursively under the extended path.
pub fn merge_object_nodes(
    left: &ObjectNode,
    right: &ObjectNode,
    path_so_far: &mut FieldPath,
) -> Result<ObjectNode, UpdateError> {
    let mut merged = ObjectNode::new();

    for (name, left_child) in left.children() {
        let child = match right.get_child(name) {
            Some(right_child) => {
                merge_children(left_child, right_child, path_so_far, name)?
            }
            None => left_child.clone(),
        };
        merged.set_child(name, child);
    }
    for (name, right_child) in right.children() {
        if left.get_child(name).is_none() {
            merged.set_child(name, right_child.clone());
        }
    }

    // The positional child lives outside the literal-children map and merges
    // under the "$" name.
    match (left.positional_child(), right.positional_child()) {
        (Some(left_pos), Some(right_pos)) => {
            let child = merge_children(left_pos, right_pos, path_so_far, POSITIONAL)?;
            merged.set_child(POSITIONAL, child);
        }
        (Some(pos), None) | (None, Some(pos)) => merged.set_child(POSITIONAL, pos.clone()),
        (None, None) => {}
    }

    Ok(merged)
}

fn merge_children(
    left: &UpdateNode,
    right: &UpdateNode,
    path_so_far: &mut FieldPath,
    name: &str,
) -> Result<UpdateNode, UpdateError> {
    path_so_far.push(name);
    let result = merge_update_nodes(left, right, path_so_far);
    path_so_far.pop();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::parse_and_merge;
    use crate::modifier::{ModifierKind, ModifierRegistry};
    use docstore_update_model::{UpdateErrorCode, Value};

    fn compile(paths: &[&str]) -> ObjectNode {
        let registry = ModifierRegistry::default();
        let mut root = ObjectNode::new();
        for path in paths {
            parse_and_merge(
                &mut root,
                ModifierKind::Set,
                path,
                &Value::Int(1),
                &registry,
                None,
            )
            .unwrap();
        }
        root
    }

    fn merge(left: &ObjectNode, right: &ObjectNode) -> Result<ObjectNode, UpdateError> {
        let mut path = FieldPath::new();
        path.push("root");
        merge_object_nodes(left, right, &mut path)
    }

    fn object_child<'a>(node: &'a ObjectNode, name: &str) -> &'a ObjectNode {
        match node.get_child(name) {
            Some(UpdateNode::Object(obj)) => obj,
            other => panic!("expected object child {name:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_should_merge_distinct_fields() {
        let merged = merge(&compile(&["a"]), &compile(&["ab"])).unwrap();
        assert!(merged.get_child("a").is_some_and(UpdateNode::is_leaf));
        assert!(merged.get_child("ab").is_some_and(UpdateNode::is_leaf));
    }

    #[test]
    fn test_should_merge_nested_fields_under_shared_prefix() {
        let merged = merge(&compile(&["a.b.c"]), &compile(&["a.b.d"])).unwrap();
        let b = object_child(object_child(&merged, "a"), "b");
        assert!(b.get_child("c").is_some_and(UpdateNode::is_leaf));
        assert!(b.get_child("d").is_some_and(UpdateNode::is_leaf));
    }

    #[test]
    fn test_should_merge_field_and_positional_siblings() {
        let merged = merge(&compile(&["a.b"]), &compile(&["a.$"])).unwrap();
        let a = object_child(&merged, "a");
        assert!(a.get_child("b").is_some_and(UpdateNode::is_leaf));
        assert!(a.positional_child().is_some_and(UpdateNode::is_leaf));
    }

    #[test]
    fn test_should_merge_through_positional() {
        let merged = merge(&compile(&["a.$.b"]), &compile(&["a.$.c"])).unwrap();
        let a = object_child(&merged, "a");
        let positional = match a.positional_child() {
            Some(UpdateNode::Object(obj)) => obj,
            other => panic!("expected positional object, got {other:?}"),
        };
        assert!(positional.get_child("b").is_some());
        assert!(positional.get_child("c").is_some());
    }

    #[test]
    fn test_should_preserve_all_leaves_with_disjoint_children() {
        let merged = merge(&compile(&["a.x", "b.y"]), &compile(&["a.z", "c"])).unwrap();
        let a = object_child(&merged, "a");
        assert!(a.get_child("x").is_some());
        assert!(a.get_child("z").is_some());
        assert!(merged.get_child("b").is_some());
        assert!(merged.get_child("c").is_some_and(UpdateNode::is_leaf));
    }

    #[test]
    fn test_should_fail_top_level_conflict() {
        let err = merge(&compile(&["a"]), &compile(&["a"])).unwrap_err();
        assert_eq!(err.code, UpdateErrorCode::ConflictingUpdateOperators);
        assert_eq!(err.message, "Update created a conflict at 'root.a'");
    }

    #[test]
    fn test_should_fail_nested_conflict_with_deep_path() {
        let err = merge(&compile(&["a.b"]), &compile(&["a.b"])).unwrap_err();
        assert_eq!(err.message, "Update created a conflict at 'root.a.b'");
        assert_eq!(err.path.as_deref(), Some("root.a.b"));
    }

    #[test]
    fn test_should_fail_when_leaf_is_prefix_of_subtree() {
        let cases: [(&[&str], &[&str]); 2] = [(&["a.b"], &["a.b.c"]), (&["a.b.c"], &["a.b"])];
        for (left, right) in cases {
            let err = merge(&compile(left), &compile(right)).unwrap_err();
            assert_eq!(err.code, UpdateErrorCode::ConflictingUpdateOperators);
            assert_eq!(err.message, "Update created a conflict at 'root.a.b'");
        }
    }

    #[test]
    fn test_should_fail_conflict_through_positional() {
        let err = merge(&compile(&["a.$.c"]), &compile(&["a.$.c.d"])).unwrap_err();
        assert_eq!(err.message, "Update created a conflict at 'root.a.$.c'");
    }

    #[test]
    fn test_should_fail_conflicting_positional_children() {
        let err = merge(&compile(&["a.$"]), &compile(&["a.$"])).unwrap_err();
        assert_eq!(err.message, "Update created a conflict at 'root.a.$'");
    }

    #[test]
    fn test_should_restore_path_accumulator_after_merge() {
        let mut path = FieldPath::new();
        path.push("root");
        let left = UpdateNode::Object(compile(&["a.b"]));
        let right = UpdateNode::Object(compile(&["a.b"]));
        let _ = merge_update_nodes(&left, &right, &mut path).unwrap_err();
        assert_eq!(path.dotted(), "root");
    }
}
