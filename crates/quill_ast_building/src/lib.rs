//! The backtracking AST builder.
//!
//! Token groups are resolved to statements by trial-parsing every "final"
//! node kind in a fixed registration order. A candidate may consume the whole
//! group, consume a prefix and request a nested block (a suspension point:
//! the partially built node waits on a frame stack until the matching `}`
//! arrives many groups later), or fail with a typed syntax error. When every
//! candidate fails, the errors are aggregated into a single diagnostic.

pub mod builder;
pub mod cursor;
pub mod error;
pub mod grammar;

pub use builder::AstBuilder;
pub use error::{SyntaxError, SyntaxErrorKind};

/// Expression nesting beyond this depth is rejected at build time, bounding
/// recursion for every later tree walk.
pub const MAX_EXPR_DEPTH: usize = 256;
