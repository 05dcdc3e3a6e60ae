//! The printer framework: a byte sink with indentation tracking and an
//! anonymous-label counter, plus the `NodeKind` set backends use to
//! advertise what they support (spec §4.6, REDESIGN FLAGS "partial
//! backends").

pub mod c_backend;
pub mod flame_backend;
pub mod mason_backend;

use std::fmt::Write as _;

/// Every AST construct a backend might need to emit, used for the
/// pre-analysis "does this backend support this script" check (SPEC_FULL
/// §C). Coarser than `Expr`/`Stmt` variants — grouped by what a printer
/// actually branches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    RangeFor,
    CollectionFor,
    NearFor,
    Simulate,
    NewArray,
    ArrayInit,
    AgentCreation,
    Ternary,
}

/// A byte sink with indentation state and a label counter, shared by every
/// backend's printer (spec §4.6).
pub struct Printer {
    buf: String,
    indent: usize,
    anon_counter: usize,
}

impl Printer {
    pub fn new() -> Self {
        Self {
            buf: String::new(),
            indent: 0,
            anon_counter: 0,
        }
    }

    pub fn indent(&mut self) {
        self.indent += 1;
    }

    pub fn outdent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    pub fn write(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    pub fn write_fmt_args(&mut self, args: std::fmt::Arguments<'_>) {
        let _ = self.buf.write_fmt(args);
    }

    pub fn newline(&mut self) {
        self.buf.push('\n');
        for _ in 0..self.indent {
            self.buf.push_str("    ");
        }
    }

    /// `__anon0`, `__anon1`, … — used by for-loop lowering to name hoisted
    /// bound/index locals (spec §4.6).
    pub fn make_anon_label(&mut self) -> String {
        let label = format!("__anon{}", self.anon_counter);
        self.anon_counter += 1;
        label
    }

    pub fn finish(self) -> String {
        self.buf
    }
}

impl Default for Printer {
    fn default() -> Self {
        Self::new()
    }
}

/// Escapes `"` and `\` the way every C-family backend's string literals do
/// (spec §4.6).
pub fn escape_string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anon_labels_are_unique_and_sequential() {
        let mut printer = Printer::new();
        assert_eq!(printer.make_anon_label(), "__anon0");
        assert_eq!(printer.make_anon_label(), "__anon1");
    }

    #[test]
    fn indentation_tracks_newlines() {
        let mut printer = Printer::new();
        printer.write("{");
        printer.indent();
        printer.newline();
        printer.write("x;");
        printer.outdent();
        printer.newline();
        printer.write("}");
        assert_eq!(printer.finish(), "{\n    x;\n}");
    }

    #[test]
    fn string_escaping_handles_quotes_and_backslashes() {
        assert_eq!(escape_string_literal(r#"a"b\c"#), r#""a\"b\\c""#);
    }
}
