//! A compact lexer producing the token groups the builder consumes.
//!
//! The builder itself never calls this — it is handed groups by the driver —
//! but the file-based module resolver and the test suites need a real
//! tokenizer, so one ships here. Groups end at an unescaped newline or a
//! semicolon; comments and the `\` continuation marker are kept as special
//! tokens and stripped again by the builder.

use crate::spanned::Span;
use crate::symbols::{self, SPECIALS};
use crate::token::{Token, TokenGroup, TokenKind};
use thiserror::Error;

/// Tokenization failure.
#[derive(Debug, Error)]
#[error("invalid token at line {}, column {}: {message}", span.line, span.column)]
pub struct LexError {
    pub span: Span,
    pub message: String,
}

impl LexError {
    fn new(line: usize, column: usize, len: usize, message: impl Into<String>) -> Self {
        Self {
            span: Span::new(line, column, len),
            message: message.into(),
        }
    }
}

/// Splits `source` into statement groups of tokens.
pub fn tokenize(source: &str) -> Result<Vec<TokenGroup>, LexError> {
    Scanner::new(source).run()
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    column: usize,
}

impl Scanner {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
            line: 1,
            column: 0,
        }
    }

    fn run(mut self) -> Result<Vec<TokenGroup>, LexError> {
        let mut groups = Vec::new();
        let mut group: Vec<Token> = Vec::new();
        let mut continued = false;
        while let Some(c) = self.peek() {
            match c {
                '\n' => {
                    self.advance();
                    self.line += 1;
                    self.column = 0;
                    if continued {
                        continued = false;
                    } else if !group.is_empty() {
                        groups.push(TokenGroup::new(std::mem::take(&mut group)));
                    }
                }
                ';' => {
                    self.advance();
                    if !group.is_empty() {
                        groups.push(TokenGroup::new(std::mem::take(&mut group)));
                    }
                }
                c if c.is_whitespace() => {
                    self.advance();
                }
                _ => {
                    let token = self.read_token()?;
                    continued = token.is_continuation();
                    group.push(token);
                }
            }
        }
        if !group.is_empty() {
            groups.push(TokenGroup::new(group));
        }
        Ok(groups)
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
        self.column += 1;
    }

    fn rest_starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_at(i) == Some(c))
    }

    fn take(&mut self, n: usize) -> String {
        let taken: String = self.chars[self.pos..self.pos + n].iter().collect();
        self.pos += n;
        self.column += n;
        taken
    }

    /// Reads one token, resolving classes in the fixed order special,
    /// operator, literal, keyword, identifier.
    fn read_token(&mut self) -> Result<Token, LexError> {
        let (line, column) = (self.line, self.column);
        if let Some(text) = self.try_special()? {
            return Ok(Token::new(TokenKind::Special, text, line, column));
        }
        if let Some(text) = self.try_operator() {
            return Ok(Token::new(TokenKind::Operator, text, line, column));
        }
        if let Some(text) = self.try_literal()? {
            return Ok(Token::new(TokenKind::Literal, text, line, column));
        }
        if let Some(text) = self.try_keyword() {
            return Ok(Token::new(TokenKind::Keyword, text, line, column));
        }
        if let Some(text) = self.try_identifier() {
            return Ok(Token::new(TokenKind::Identifier, text, line, column));
        }
        Err(LexError::new(line, column, 1, "unrecognized character"))
    }

    fn try_special(&mut self) -> Result<Option<String>, LexError> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        if c == '#' {
            return self.read_comment().map(Some);
        }
        // a leading dot that starts a float belongs to the literal
        if c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) {
            return Ok(None);
        }
        // `==` is an operator, not two assignments
        if c == '=' && self.peek_at(1) == Some('=') {
            return Ok(None);
        }
        for special in SPECIALS {
            if self.rest_starts_with(special) {
                return Ok(Some(self.take(special.chars().count())));
            }
        }
        Ok(None)
    }

    fn read_comment(&mut self) -> Result<String, LexError> {
        let (line, column) = (self.line, self.column);
        if self.rest_starts_with("#|") {
            let mut text = self.take(2);
            let mut depth = 1usize;
            while depth > 0 {
                if self.rest_starts_with("#|") {
                    depth += 1;
                    text.push_str(&self.take(2));
                } else if self.rest_starts_with("|#") {
                    depth -= 1;
                    text.push_str(&self.take(2));
                } else if let Some(c) = self.peek() {
                    if c == '\n' {
                        self.line += 1;
                        self.column = 0;
                        self.pos += 1;
                    } else {
                        self.advance();
                    }
                    text.push(c);
                } else {
                    return Err(LexError::new(line, column, 2, "unterminated block comment"));
                }
            }
            return Ok(text);
        }
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
        }
        Ok(text)
    }

    fn try_operator(&mut self) -> Option<String> {
        for op in symbols::operators_longest_first() {
            if self.rest_starts_with(op) {
                let len = op.chars().count();
                // word operators must not run into an identifier
                let last_alpha = op.chars().last().is_some_and(|c| c.is_alphabetic());
                let next_is_ident = self
                    .peek_at(len)
                    .is_some_and(|c| c.is_alphanumeric() || c == '_');
                if last_alpha && next_is_ident {
                    continue;
                }
                return Some(self.take(len));
            }
        }
        None
    }

    fn try_literal(&mut self) -> Result<Option<String>, LexError> {
        let Some(c) = self.peek() else {
            return Ok(None);
        };
        if c == '"' || c == '\'' {
            return self.read_string(c).map(Some);
        }
        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            return self.read_number().map(Some);
        }
        for word in ["true", "false"] {
            if self.rest_starts_with(word) {
                let boundary = self
                    .peek_at(word.len())
                    .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
                if boundary {
                    return Ok(Some(self.take(word.len())));
                }
            }
        }
        Ok(None)
    }

    fn read_string(&mut self, quote: char) -> Result<String, LexError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        text.push(quote);
        self.advance();
        let mut escaped = false;
        while let Some(c) = self.peek() {
            if c == '\n' {
                break;
            }
            text.push(c);
            self.advance();
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                return Ok(text);
            }
        }
        Err(LexError::new(
            line,
            column,
            text.chars().count(),
            "unterminated string literal",
        ))
    }

    fn read_number(&mut self) -> Result<String, LexError> {
        let (line, column) = (self.line, self.column);
        let mut text = String::new();
        let radix = if self.rest_starts_with("0b") {
            text.push_str(&self.take(2));
            2
        } else if self.rest_starts_with("0o") {
            text.push_str(&self.take(2));
            8
        } else if self.rest_starts_with("0x") {
            text.push_str(&self.take(2));
            16
        } else {
            10
        };
        let mut seen_dot = false;
        while let Some(c) = self.peek() {
            if c == '_' {
                text.push(c);
                self.advance();
            } else if c.is_digit(radix) {
                text.push(c);
                self.advance();
            } else if c == '.' && radix == 10 && !seen_dot {
                // `..` after a number is the range special, not a float dot
                if self.peek_at(1) == Some('.') {
                    break;
                }
                seen_dot = true;
                text.push(c);
                self.advance();
            } else if c.is_alphanumeric() {
                return Err(LexError::new(
                    line,
                    column,
                    text.chars().count() + 1,
                    "malformed numeric literal",
                ));
            } else {
                break;
            }
        }
        Ok(text)
    }

    fn try_keyword(&mut self) -> Option<String> {
        for (kw, _) in symbols::KEYWORDS {
            if self.rest_starts_with(kw) {
                let boundary = self
                    .peek_at(kw.len())
                    .is_none_or(|c| !(c.is_alphanumeric() || c == '_'));
                if boundary {
                    return Some(self.take(kw.len()));
                }
            }
        }
        None
    }

    fn try_identifier(&mut self) -> Option<String> {
        let c = self.peek()?;
        if !(c.is_alphabetic() || c == '_') {
            return None;
        }
        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                text.push(c);
                self.advance();
            } else {
                break;
            }
        }
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(group: &TokenGroup) -> Vec<(TokenKind, String)> {
        group
            .tokens()
            .iter()
            .map(|t| (t.kind(), t.text().to_string()))
            .collect()
    }

    #[test]
    fn test_simple_statement() {
        let groups = tokenize("int x = 5\n").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(
            kinds(&groups[0]),
            vec![
                (TokenKind::Identifier, "int".to_string()),
                (TokenKind::Identifier, "x".to_string()),
                (TokenKind::Special, "=".to_string()),
                (TokenKind::Literal, "5".to_string()),
            ]
        );
    }

    #[test]
    fn test_semicolon_splits_groups() {
        let groups = tokenize("x = 1; y = 2").unwrap();
        assert_eq!(groups.len(), 2);
    }

    #[test]
    fn test_equality_is_an_operator() {
        let groups = tokenize("a == b").unwrap();
        assert!(groups[0].tokens()[1].is_operator("=="));
    }

    #[test]
    fn test_word_operator_boundary() {
        let groups = tokenize("x in infos").unwrap();
        let toks = kinds(&groups[0]);
        assert_eq!(toks[1], (TokenKind::Operator, "in".to_string()));
        assert_eq!(toks[2], (TokenKind::Identifier, "infos".to_string()));
    }

    #[test]
    fn test_continuation_joins_lines() {
        let groups = tokenize("x = 1 + \\\n    2\n").unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].tokens().iter().any(|t| t.is_continuation()));
    }

    #[test]
    fn test_comment_token_kept_in_group() {
        let groups = tokenize("x = 1 # note\n").unwrap();
        assert_eq!(groups.len(), 1);
        assert!(groups[0].tokens().last().unwrap().is_comment());
        assert_eq!(groups[0].stripped().len(), 3);
    }

    #[test]
    fn test_block_comment_nesting() {
        let groups = tokenize("x #| outer #| inner |# still |# = 1").unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].stripped().len(), 3);
    }

    #[test]
    fn test_radix_literals() {
        let groups = tokenize("0x1f 0b101 0o17 1_000 2.5").unwrap();
        let toks = kinds(&groups[0]);
        assert!(toks.iter().all(|(k, _)| *k == TokenKind::Literal));
        assert_eq!(toks.len(), 5);
    }

    #[test]
    fn test_bad_number_is_error() {
        assert!(tokenize("12abc").is_err());
    }

    #[test]
    fn test_keyword_vs_identifier() {
        let groups = tokenize("return returning").unwrap();
        let toks = kinds(&groups[0]);
        assert_eq!(toks[0], (TokenKind::Keyword, "return".to_string()));
        assert_eq!(toks[1], (TokenKind::Identifier, "returning".to_string()));
    }

    #[test]
    fn test_char_and_string_literals() {
        let groups = tokenize("'a' \"ab\\\"c\"").unwrap();
        let toks = kinds(&groups[0]);
        assert_eq!(toks[0], (TokenKind::Literal, "'a'".to_string()));
        assert_eq!(toks[1], (TokenKind::Literal, "\"ab\\\"c\"".to_string()));
    }
}
