//! Document model types for the Docstore update engine.
//!
//! This crate provides the tree-structured document value (`Value`), the
//! collation specification passed through to modifier construction, and the
//! structured error type shared by the compiler, merge, and apply stages.
#![allow(clippy::module_name_repetitions)]

pub mod collation;
pub mod error;
pub mod value;

pub use collation::Collation;
pub use error::{UpdateError, UpdateErrorCode};
pub use value::Value;
