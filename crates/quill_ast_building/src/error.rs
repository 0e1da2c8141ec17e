//! Syntax errors, including the multi-candidate aggregation the builder
//! raises when every final node kind rejects a group.

use itertools::Itertools;
use quill_tokens::spanned::render_excerpt;
use quill_tokens::{Span, Spanned, Token};
use std::fmt::{Display, Formatter};
use thiserror::Error;

/// A build-phase failure. Always fatal to the parse; no partial tree is
/// returned.
#[derive(Debug)]
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub span: Option<Span>,
    pub scope: Option<String>,
    /// Which candidate node kind was being parsed, for aggregation labels.
    pub usage: Option<&'static str>,
    /// Fatal errors abort the parse instead of backtracking to the next
    /// candidate.
    pub fatal: bool,
}

#[derive(Debug, Error)]
pub enum SyntaxErrorKind {
    #[error("expected {expected}, found {found}")]
    Expected { expected: String, found: String },
    #[error("expected {}, found {}", expected.iter().join(", "), found.iter().join(", "))]
    MultiExpected {
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("expected more tokens for {0}")]
    ExpectedMore(String),
    #[error("unknown structure")]
    UnknownStructure,
    #[error("expression nesting exceeds the supported depth")]
    TooDeep,
    #[error("unclosed block at end of input")]
    UnclosedBlock,
    #[error("{0}")]
    Other(String),
}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, span: impl Into<Option<Span>>) -> Self {
        Self {
            kind,
            span: span.into(),
            scope: None,
            usage: None,
            fatal: false,
        }
    }

    /// Marks this error unrecoverable: no further candidates are tried.
    pub fn fatal(mut self) -> Self {
        self.fatal = true;
        self
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    pub fn with_usage(mut self, usage: &'static str) -> Self {
        self.usage = Some(usage);
        self
    }

    /// `expected` vs what the cursor actually held.
    pub fn expected(expected: impl Into<String>, found: Option<&Token>) -> Self {
        match found {
            Some(token) => Self::new(
                SyntaxErrorKind::Expected {
                    expected: expected.into(),
                    found: token.describe(),
                },
                token.span(),
            ),
            None => Self::new(
                SyntaxErrorKind::Expected {
                    expected: expected.into(),
                    found: "nothing".to_string(),
                },
                None,
            ),
        }
    }

    /// A trailing token where the candidate expected the group to end.
    pub fn expected_nothing(found: &Token) -> Self {
        Self::new(
            SyntaxErrorKind::Expected {
                expected: "nothing".to_string(),
                found: found.describe(),
            },
            found.span(),
        )
    }

    /// Merges every candidate's failure into one diagnostic: the union of
    /// expected reasons and the union of found tokens, deduplicated and
    /// sorted. This aggregation is contract; the exact strings are not.
    pub fn from_candidates(errors: Vec<SyntaxError>) -> SyntaxError {
        let span = errors
            .iter()
            .filter_map(|e| e.span)
            .max_by_key(|s| (s.line, s.column));
        let mut expected = Vec::new();
        let mut found = Vec::new();
        for error in errors {
            match error.kind {
                SyntaxErrorKind::Expected {
                    expected: e,
                    found: f,
                } => {
                    let label = match error.usage {
                        Some(usage) => format!("{e} (for {usage})"),
                        None => e,
                    };
                    expected.push(label);
                    if f != "nothing" {
                        let at = error
                            .span
                            .map(|s| format!(" at line {}, column {}", s.line, s.column))
                            .unwrap_or_default();
                        found.push(format!("{f}{at}"));
                    }
                }
                SyntaxErrorKind::MultiExpected {
                    expected: e,
                    found: f,
                } => {
                    expected.extend(e);
                    found.extend(f);
                }
                other => expected.push(other.to_string()),
            }
        }
        expected.sort();
        expected.dedup();
        found.sort();
        found.dedup();
        if found.is_empty() {
            found.push("nothing".to_string());
        }
        SyntaxError::new(SyntaxErrorKind::MultiExpected { expected, found }, span)
    }

    /// Renders the error with a caret-annotated excerpt out of the caller's
    /// source text.
    pub fn render_with_source(&self, source: &str) -> String {
        match self.span {
            Some(span) => format!("{self}\n{}", render_excerpt(source, span, 1)),
            None => self.to_string(),
        }
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "(in {scope}) ")?;
        }
        write!(f, "syntax error: {}", self.kind)?;
        if let Some(span) = &self.span {
            write!(f, " at line {}, column {}", span.line, span.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for SyntaxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quill_tokens::TokenKind;

    #[test]
    fn test_aggregation_dedups_and_sorts() {
        let t = Token::new(TokenKind::Special, "{", 3, 8);
        let errors = vec![
            SyntaxError::expected("identifier", Some(&t)).with_usage("vardef"),
            SyntaxError::expected("identifier", Some(&t)).with_usage("vardef"),
            SyntaxError::expected("'('", Some(&t)).with_usage("funcdef"),
        ];
        let merged = SyntaxError::from_candidates(errors);
        match merged.kind {
            SyntaxErrorKind::MultiExpected { expected, found } => {
                assert_eq!(
                    expected,
                    vec![
                        "'(' (for funcdef)".to_string(),
                        "identifier (for vardef)".to_string()
                    ]
                );
                assert_eq!(found.len(), 1);
                assert!(found[0].starts_with("special '{'"));
            }
            other => panic!("expected MultiExpected, got {other:?}"),
        }
        assert_eq!(merged.span, Some(Span::new(3, 8, 1)));
    }

    #[test]
    fn test_aggregation_flattens_nested_multi() {
        let inner = SyntaxError::new(
            SyntaxErrorKind::MultiExpected {
                expected: vec!["literal".to_string()],
                found: vec!["keyword 'if' at line 1, column 0".to_string()],
            },
            Span::new(1, 0, 2),
        );
        let merged = SyntaxError::from_candidates(vec![inner]);
        match merged.kind {
            SyntaxErrorKind::MultiExpected { expected, .. } => {
                assert_eq!(expected, vec!["literal".to_string()]);
            }
            other => panic!("expected MultiExpected, got {other:?}"),
        }
    }
}
