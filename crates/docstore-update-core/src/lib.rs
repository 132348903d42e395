//! Update-modifier path-tree engine for Docstore.
//!
//! An update expression is a set of dotted field paths, each annotated with a
//! modifier operation. This crate compiles such an expression into a prefix
//! tree ([`node::ObjectNode`]), detects logically conflicting writes at
//! compile time, merges independently-compiled subtrees (needed when a
//! positional path and a literal array index turn out to denote the same
//! element), and applies the compiled tree to a concrete document, producing
//! the mutated document plus a minimal, deterministic replication log.
//!
//! The pipeline is:
//!
//! 1. **Lexing**: split a dotted path into validated segments ([`path`]).
//! 2. **Compilation**: walk/extend the tree and install leaves ([`compile`]).
//! 3. **Application**: ordered depth-first mutation of a document ([`apply`]),
//!    merging positional and literal subtrees lazily once the matched array
//!    index is known ([`merge`]).
#![allow(clippy::module_name_repetitions)]

pub mod apply;
pub mod compile;
pub mod driver;
pub mod index_paths;
pub mod log;
pub mod merge;
pub mod modifier;
pub mod node;
pub mod path;

pub use apply::{Applier, ApplyResult};
pub use compile::parse_and_merge;
pub use driver::UpdateDriver;
pub use index_paths::{IndexPathOracle, IndexPathSet};
pub use log::LogBuilder;
pub use merge::merge_update_nodes;
pub use modifier::{LeafNode, ModifierKind, ModifierRegistry};
pub use node::{ObjectNode, UpdateNode};
pub use path::{FieldPath, PathSegment};
