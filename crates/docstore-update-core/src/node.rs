//! The compiled update tree.
//!
//! An update expression compiles into a prefix tree whose internal nodes are
//! [`ObjectNode`]s and whose terminals are [`LeafNode`]s. The root is always
//! an `ObjectNode`: an update request targets zero or more paths. Once
//! compilation finishes the tree is immutable and safe to share read-only
//! across threads, each applying it to its own document.

use std::collections::BTreeMap;

use crate::modifier::LeafNode;
use crate::path::POSITIONAL;

/// A node in the compiled update tree.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateNode {
    /// A terminal node carrying one modifier. No path may be compiled
    /// through a leaf.
    Leaf(LeafNode),
    /// An internal node multiplexing a path onto its children.
    Object(ObjectNode),
}

impl UpdateNode {
    /// Returns `true` if this is a leaf node.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }
}

/// An internal node: a mapping from segment name to exclusively-owned child.
///
/// Children are stored sorted by name, so iteration for application and merge
/// is always lexicographic. The positional child (`$`) lives outside the map
/// and is resolved to a concrete numeric key at apply time, after which it
/// takes part in the lexicographic ordering under its resolved name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjectNode {
    children: BTreeMap<String, UpdateNode>,
    positional_child: Option<Box<UpdateNode>>,
}

impl ObjectNode {
    /// An empty object node, the starting point of compilation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the child under `field`. The literal name `$` resolves to the
    /// positional child.
    #[must_use]
    pub fn get_child(&self, field: &str) -> Option<&UpdateNode> {
        if field == POSITIONAL {
            self.positional_child.as_deref()
        } else {
            self.children.get(field)
        }
    }

    /// Mutable variant of [`ObjectNode::get_child`].
    pub fn get_child_mut(&mut self, field: &str) -> Option<&mut UpdateNode> {
        if field == POSITIONAL {
            self.positional_child.as_deref_mut()
        } else {
            self.children.get_mut(field)
        }
    }

    /// Installs `child` under `field`, which must not already have a child.
    /// The literal name `$` installs the positional child.
    pub fn set_child(&mut self, field: &str, child: UpdateNode) {
        if field == POSITIONAL {
            debug_assert!(self.positional_child.is_none());
            self.positional_child = Some(Box::new(child));
        } else {
            debug_assert!(!self.children.contains_key(field));
            self.children.insert(field.to_owned(), child);
        }
    }

    /// The literal (non-positional) children, iterated in lexicographic
    /// order by name.
    #[must_use]
    pub fn children(&self) -> &BTreeMap<String, UpdateNode> {
        &self.children
    }

    /// The positional (`$`) child, if any.
    #[must_use]
    pub fn positional_child(&self) -> Option<&UpdateNode> {
        self.positional_child.as_deref()
    }

    /// Returns `true` if this node has no children at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty() && self.positional_child.is_none()
    }
}
