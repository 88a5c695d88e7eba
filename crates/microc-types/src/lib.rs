//! Shared types for MicroC.
//!
//! This crate defines the AST node set, structural traversal (cursor and
//! pre-order walk), and the static validation pass that runs before
//! evaluation.

mod error;
pub mod ast;
pub mod tree;
pub mod validate;

pub use error::{SemanticError, SemanticErrorKind};
pub use tree::{walk, Cursor, Node};
pub use validate::{is_reserved, validate_program, validate_tree, RESERVED};
