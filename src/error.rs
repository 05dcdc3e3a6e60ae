//! Error types for every stage of compilation, plus the two reporting
//! surfaces the CLI uses: a plain `"<msg> on line <line>"` stream (the
//! default, per spec) and an `ariadne`-backed pretty reporter.

use ariadne::{Color, Label, Report, ReportKind, Source};
use std::fmt;
use thiserror::Error;

pub type Span = chumsky::span::SimpleSpan<usize>;

/// A resolved file location. Line/column are computed lazily at report time
/// from a raw byte span, rather than carried on every AST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location {
    pub span: Span,
}

impl Location {
    pub fn new(span: Span) -> Self {
        Self { span }
    }

    /// 1-based line number of `span.start` within `source`.
    pub fn line(&self, source: &str) -> usize {
        source[..self.span.start.min(source.len())]
            .bytes()
            .filter(|&b| b == b'\n')
            .count()
            + 1
    }
}

#[derive(Debug, Error)]
pub enum OpenABLError {
    #[error("I/O error: {0}")]
    Io(String),

    #[error("syntax error: {message}")]
    Syntax { message: String, loc: Location },

    #[error("undeclared variable '{name}'")]
    UndeclaredVariable { name: String, loc: Location },

    #[error("redeclaration of '{name}'")]
    Redeclaration { name: String, loc: Location },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: String,
        found: String,
        loc: Location,
    },

    #[error("no matching overload for '{name}'")]
    NoMatchingOverload { name: String, loc: Location },

    #[error("ambiguous overload for '{name}'")]
    AmbiguousOverload { name: String, loc: Location },

    #[error("cannot assign to const '{name}'")]
    AssignToConst { name: String, loc: Location },

    #[error("illegal form of 'for' loop")]
    IllegalForForm { loc: Location },

    #[error("const '{name}' must be initialized with a constant expression")]
    NonConstInitializer { name: String, loc: Location },

    #[error("invalid literal for parameter '{name}': {value}")]
    InvalidParamLiteral { name: String, value: String, loc: Location },

    #[error("'{ty}' has no member '{member}'")]
    UnknownMember {
        ty: String,
        member: String,
        loc: Location,
    },

    #[error("unsupported backend '{name}'")]
    UnsupportedBackend { name: String },

    #[error("'{backend}' does not support {kind}")]
    UnsupportedNodeKind {
        backend: String,
        kind: String,
        loc: Location,
    },

    #[error("cannot write to a member of a foreign agent inside a step function")]
    ForeignAgentWrite { loc: Location },
}

impl OpenABLError {
    pub fn location(&self) -> Option<Location> {
        use OpenABLError::*;
        match self {
            Io(_) | UnsupportedBackend { .. } => None,
            Syntax { loc, .. }
            | UndeclaredVariable { loc, .. }
            | Redeclaration { loc, .. }
            | TypeMismatch { loc, .. }
            | NoMatchingOverload { loc, .. }
            | AmbiguousOverload { loc, .. }
            | AssignToConst { loc, .. }
            | IllegalForForm { loc }
            | NonConstInitializer { loc, .. }
            | InvalidParamLiteral { loc, .. }
            | UnknownMember { loc, .. }
            | UnsupportedNodeKind { loc, .. }
            | ForeignAgentWrite { loc } => Some(*loc),
        }
    }

    /// The default plain-text rendering the spec mandates: `"<msg> on line
    /// <line>"`, or just `"<msg>"` for errors with no location (I/O, unknown
    /// backend name).
    pub fn render(&self, source: &str) -> String {
        match self.location() {
            Some(loc) => format!("{} on line {}", self, loc.line(source)),
            None => self.to_string(),
        }
    }
}

/// Accumulates errors during analysis instead of failing on the first one,
/// so a single compile invocation can report every problem it finds.
#[derive(Debug, Default)]
pub struct ErrorStream {
    errors: Vec<OpenABLError>,
}

impl ErrorStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, err: OpenABLError) {
        self.errors.push(err);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[OpenABLError] {
        &self.errors
    }

    pub fn into_errors(self) -> Vec<OpenABLError> {
        self.errors
    }
}

impl fmt::Display for ErrorStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.errors {
            writeln!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Pretty, source-snippet reporter for `--pretty-errors`, built on `ariadne`
/// the way the teacher's parser crate reports syntax errors.
pub struct ErrorReporter<'a> {
    filename: &'a str,
    source: &'a str,
}

impl<'a> ErrorReporter<'a> {
    pub fn new(filename: &'a str, source: &'a str) -> Self {
        Self { filename, source }
    }

    pub fn report(&self, err: &OpenABLError) -> String {
        let Some(loc) = err.location() else {
            return err.to_string();
        };
        let span = loc.span.start..loc.span.end;
        let mut buf = Vec::new();
        Report::build(ReportKind::Error, self.filename, span.start)
            .with_message(err.to_string())
            .with_label(
                Label::new((self.filename, span))
                    .with_message(err.to_string())
                    .with_color(Color::Red),
            )
            .finish()
            .write((self.filename, Source::from(self.source)), &mut buf)
            .expect("ariadne report writes to an in-memory buffer");
        String::from_utf8_lossy(&buf).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(start: usize, end: usize) -> Location {
        Location::new(Span::new(start, end))
    }

    #[test]
    fn line_resolution_counts_newlines() {
        let source = "a\nb\nc";
        assert_eq!(loc(0, 1).line(source), 1);
        assert_eq!(loc(2, 3).line(source), 2);
        assert_eq!(loc(4, 5).line(source), 3);
    }

    #[test]
    fn render_matches_plain_contract() {
        let err = OpenABLError::UndeclaredVariable {
            name: "x".into(),
            loc: loc(2, 3),
        };
        assert_eq!(err.render("a\nx"), "undeclared variable 'x' on line 2");
    }

    #[test]
    fn io_errors_have_no_location() {
        let err = OpenABLError::Io("file not found".into());
        assert_eq!(err.render(""), "I/O error: file not found");
    }

    #[test]
    fn error_stream_accumulates() {
        let mut stream = ErrorStream::new();
        assert!(stream.is_empty());
        stream.push(OpenABLError::Io("x".into()));
        stream.push(OpenABLError::UnsupportedBackend { name: "gpu".into() });
        assert_eq!(stream.errors().len(), 2);
    }
}
