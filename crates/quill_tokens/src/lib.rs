//! Token model for the quill front end, plus the spans and source excerpts
//! every later stage uses for diagnostics.

pub mod lexing;
pub mod spanned;
pub mod symbols;
pub mod token;

pub use spanned::{Span, Spanned};
pub use token::{Token, TokenGroup, TokenKind};
