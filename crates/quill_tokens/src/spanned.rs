//! Source positions and the caret-annotated excerpt renderer shared by every
//! diagnostic in the front end.
//!
//! Source text is injected by the caller when an error is rendered; nothing in
//! here re-reads files.

use std::fmt::Write as _;

/// A region of source text: 1-based line, 0-based column, length in columns.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Default)]
pub struct Span {
    pub line: usize,
    pub column: usize,
    pub len: usize,
}

impl Span {
    /// Creates a new span
    pub const fn new(line: usize, column: usize, len: usize) -> Self {
        Self { line, column, len }
    }

    /// A zero-length span directly after this one
    pub const fn end(&self) -> Self {
        Self {
            line: self.line,
            column: self.column + self.len,
            len: 0,
        }
    }

    /// The span covering both spans. Joining across lines keeps the earlier
    /// line's extent, since lengths are per-line column counts.
    pub fn join(&self, other: Span) -> Span {
        if self.line != other.line {
            return if self.line < other.line { *self } else { other };
        }
        let start = self.column.min(other.column);
        let end = (self.column + self.len).max(other.column + other.len);
        Span::new(self.line, start, end - start)
    }
}

/// A value with a known source location.
pub trait Spanned {
    fn span(&self) -> Span;
}

impl Spanned for Span {
    fn span(&self) -> Span {
        *self
    }
}

/// Renders a one/two-line caret-annotated excerpt for `span` out of the given
/// source text, with `context` lines shown above the offending line.
pub fn render_excerpt(source: &str, span: Span, context: usize) -> String {
    let mut out = String::new();
    if span.line == 0 {
        return out;
    }
    let first = span.line.saturating_sub(context).max(1);
    let width = span.line.to_string().len().max(1);
    for (idx, line) in source.lines().enumerate() {
        let line_n = idx + 1;
        if line_n < first || line_n > span.line {
            continue;
        }
        let _ = writeln!(out, "{line_n:width$} | {}", line.trim_end());
        if line_n == span.line {
            let col = span.column.min(line.len());
            let marker = if span.len > 0 {
                "^".repeat(span.len.min(line.len().saturating_sub(col).max(1)))
            } else {
                "^".to_string()
            };
            let _ = writeln!(out, "{} | {}{marker}", " ".repeat(width), " ".repeat(col));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_end() {
        let span = Span::new(1, 4, 3);
        assert_eq!(span.end(), Span::new(1, 7, 0));
    }

    #[test]
    fn test_join_same_line() {
        let a = Span::new(2, 0, 2);
        let b = Span::new(2, 8, 4);
        assert_eq!(a.join(b), Span::new(2, 0, 12));
    }

    #[test]
    fn test_join_across_lines_keeps_earlier() {
        let a = Span::new(1, 4, 2);
        let b = Span::new(3, 0, 1);
        assert_eq!(a.join(b), a);
        assert_eq!(b.join(a), a);
    }

    #[test]
    fn test_render_excerpt_points_at_column() {
        let src = "int x = 1\nint x = 2\n";
        let rendered = render_excerpt(src, Span::new(2, 4, 1), 1);
        assert!(rendered.contains("2 | int x = 2"));
        assert!(rendered.lines().last().unwrap().contains("    ^"));
    }
}
