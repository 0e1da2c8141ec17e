//! Validation errors. Fail-fast: the first invariant violation aborts the
//! walk carrying the offending node's span and scope.

use quill_tokens::spanned::render_excerpt;
use quill_tokens::Span;
use std::fmt::{Display, Formatter};
use thiserror::Error;

#[derive(Debug)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub span: Option<Span>,
    pub scope: Option<String>,
}

#[derive(Debug, Error)]
pub enum ValidationErrorKind {
    #[error("'{0}' is not defined")]
    NotDefined(String),
    #[error("'{name}' redefined (defined as '{existing}')")]
    Redefined { name: String, existing: String },
    #[error("not implemented: {0}")]
    NotImplemented(String),
    #[error("{0}")]
    General(String),
}

impl ValidationError {
    pub fn new(kind: ValidationErrorKind, span: impl Into<Option<Span>>) -> Self {
        Self {
            kind,
            span: span.into(),
            scope: None,
        }
    }

    pub fn not_defined(name: impl Into<String>, span: impl Into<Option<Span>>) -> Self {
        Self::new(ValidationErrorKind::NotDefined(name.into()), span)
    }

    pub fn redefined(
        name: impl Into<String>,
        existing: impl Into<String>,
        span: impl Into<Option<Span>>,
    ) -> Self {
        Self::new(
            ValidationErrorKind::Redefined {
                name: name.into(),
                existing: existing.into(),
            },
            span,
        )
    }

    pub fn not_implemented(what: impl Into<String>, span: impl Into<Option<Span>>) -> Self {
        Self::new(ValidationErrorKind::NotImplemented(what.into()), span)
    }

    pub fn general(message: impl Into<String>, span: impl Into<Option<Span>>) -> Self {
        Self::new(ValidationErrorKind::General(message.into()), span)
    }

    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
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

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if let Some(scope) = &self.scope {
            write!(f, "(in {scope}) ")?;
        }
        write!(f, "validation error: {}", self.kind)?;
        if let Some(span) = &self.span {
            write!(f, " at line {}, column {}", span.line, span.column)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}
