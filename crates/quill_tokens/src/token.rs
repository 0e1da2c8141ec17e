//! Lexical tokens and the statement groups the builder consumes.
//!
//! The tokenizer hands the builder an ordered sequence of groups; a group ends
//! at an unescaped newline or semicolon, and block bodies are *not* pre-split:
//! `{`/`}` appear inline as special tokens.

use crate::spanned::{Span, Spanned};
use std::fmt::{Debug, Display, Formatter};

/// The five lexical classes, in lexer resolution order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TokenKind {
    Special,
    Operator,
    Literal,
    Keyword,
    Identifier,
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TokenKind::Special => "special",
            TokenKind::Operator => "operator",
            TokenKind::Literal => "literal",
            TokenKind::Keyword => "keyword",
            TokenKind::Identifier => "identifier",
        };
        write!(f, "{s}")
    }
}

/// A lexical token. Immutable once produced.
#[derive(Clone, Eq, PartialEq)]
pub struct Token {
    kind: TokenKind,
    text: String,
    span: Span,
}

impl Token {
    /// Creates a new token at the given 1-based line and 0-based column.
    pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
        let text = text.into();
        let len = text.chars().count();
        Self {
            kind,
            text,
            span: Span::new(line, column, len),
        }
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True for comment tokens (`# …` and `#| … |#` both lex to a single
    /// special token starting with `#`).
    pub fn is_comment(&self) -> bool {
        self.kind == TokenKind::Special && self.text.starts_with('#')
    }

    /// True for the line-continuation marker.
    pub fn is_continuation(&self) -> bool {
        self.kind == TokenKind::Special && self.text == "\\"
    }

    pub fn is_special(&self, text: &str) -> bool {
        self.kind == TokenKind::Special && self.text == text
    }

    pub fn is_operator(&self, text: &str) -> bool {
        self.kind == TokenKind::Operator && self.text == text
    }

    pub fn is_keyword(&self, text: &str) -> bool {
        self.kind == TokenKind::Keyword && self.text == text
    }

    /// Short description used in "expected … found …" diagnostics.
    pub fn describe(&self) -> String {
        format!("{} '{}'", self.kind, self.text)
    }
}

impl Debug for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Token({} {:?} @{}:{})",
            self.kind, self.text, self.span.line, self.span.column
        )
    }
}

impl Spanned for Token {
    fn span(&self) -> Span {
        self.span
    }
}

/// One statement group: a non-empty ordered run of tokens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenGroup(pub Vec<Token>);

impl TokenGroup {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self(tokens)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }

    /// Removes comment and line-continuation tokens. Candidates are only ever
    /// tried against the stripped group.
    pub fn stripped(&self) -> Vec<Token> {
        self.0
            .iter()
            .filter(|t| !t.is_comment() && !t.is_continuation())
            .cloned()
            .collect()
    }
}

impl FromIterator<Token> for TokenGroup {
    fn from_iter<T: IntoIterator<Item = Token>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_comments_and_continuations() {
        let group = TokenGroup::new(vec![
            Token::new(TokenKind::Identifier, "x", 1, 0),
            Token::new(TokenKind::Special, "\\", 1, 2),
            Token::new(TokenKind::Special, "# trailing", 2, 0),
        ]);
        let stripped = group.stripped();
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped[0].text(), "x");
    }

    #[test]
    fn test_token_span_len_in_chars() {
        let token = Token::new(TokenKind::Operator, "**", 3, 7);
        assert_eq!(token.span(), Span::new(3, 7, 2));
    }
}
