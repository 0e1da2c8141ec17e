//! The quill abstract syntax tree.
//!
//! A closed set of node kinds forming an owning tree. Every node carries its
//! source position plus a mutable flag set, re-serializes to parseable source
//! through [`Display`](std::fmt::Display), and reports a `length` computed
//! recursively from its typed children.

pub mod expr;
pub mod node;
pub mod stmt;

pub use expr::*;
pub use node::*;
pub use stmt::*;
