//! Node metadata and the leaf nodes shared by expressions and statements.

use quill_tokens::{Span, Spanned, Token};
use std::fmt::{Display, Formatter};

/// Mutable per-node flag set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeFlags {
    /// Marks a node for removal by its parent without immediate splicing.
    pub optimized_out: bool,
    /// Set on literals produced by constant folding.
    pub folded: bool,
}

/// Source position plus flags, carried by every node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeMeta {
    pub line: usize,
    pub column: usize,
    pub flags: NodeFlags,
}

impl NodeMeta {
    pub fn new(line: usize, column: usize) -> Self {
        Self {
            line,
            column,
            flags: NodeFlags::default(),
        }
    }

    /// Position of the token that starts the node.
    pub fn at(token: &Token) -> Self {
        let span = token.span();
        Self::new(span.line, span.column)
    }

    pub fn span_with_len(&self, len: usize) -> Span {
        Span::new(self.line, self.column, len)
    }
}

/// An identifier leaf.
#[derive(Debug, Clone)]
pub struct Identifier {
    pub name: String,
    pub meta: NodeMeta,
}

impl Identifier {
    pub fn new(name: impl Into<String>, meta: NodeMeta) -> Self {
        Self {
            name: name.into(),
            meta,
        }
    }

    pub fn length(&self) -> usize {
        self.name.chars().count()
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Spanned for Identifier {
    fn span(&self) -> Span {
        self.meta.span_with_len(self.length())
    }
}

/// A keyword leaf.
#[derive(Debug, Clone)]
pub struct KeywordNode {
    pub word: String,
    pub meta: NodeMeta,
}

impl KeywordNode {
    pub fn new(word: impl Into<String>, meta: NodeMeta) -> Self {
        Self {
            word: word.into(),
            meta,
        }
    }

    pub fn length(&self) -> usize {
        self.word.chars().count()
    }
}

impl Display for KeywordNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.word)
    }
}

impl Spanned for KeywordNode {
    fn span(&self) -> Span {
        self.meta.span_with_len(self.length())
    }
}

/// A literal leaf holding the raw source text of the literal.
#[derive(Debug, Clone)]
pub struct LiteralNode {
    pub text: String,
    pub meta: NodeMeta,
}

impl LiteralNode {
    pub fn new(text: impl Into<String>, meta: NodeMeta) -> Self {
        Self {
            text: text.into(),
            meta,
        }
    }

    pub fn length(&self) -> usize {
        self.text.chars().count()
    }
}

impl Display for LiteralNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl Spanned for LiteralNode {
    fn span(&self) -> Span {
        self.meta.span_with_len(self.length())
    }
}

/// An operator leaf.
#[derive(Debug, Clone)]
pub struct OperatorNode {
    pub op: String,
    pub meta: NodeMeta,
}

impl OperatorNode {
    pub fn new(op: impl Into<String>, meta: NodeMeta) -> Self {
        Self {
            op: op.into(),
            meta,
        }
    }

    pub fn length(&self) -> usize {
        self.op.chars().count()
    }
}

impl Display for OperatorNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.op)
    }
}

impl Spanned for OperatorNode {
    fn span(&self) -> Span {
        self.meta.span_with_len(self.length())
    }
}

/// Indents every line of `text` by one tab.
pub(crate) fn indent(text: &str) -> String {
    text.lines()
        .map(|l| {
            if l.is_empty() {
                l.to_string()
            } else {
                format!("\t{l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
