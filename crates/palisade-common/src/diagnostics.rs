//! The diagnostics sink.
//!
//! Every observable side effect of the compiler other than its decorated-AST
//! output goes through here: lexical/syntactic/symbolic/type errors, security
//! errors (explicit- and implicit-flow violations), notes attached to a prior
//! error, and `debug` statement output. A fatal diagnostic terminates the
//! process with exit code 1; there is no recovery and no partial output.

use std::cell::RefCell;

use colored::Colorize;

use crate::source::SourceFile;
use crate::span::Span;

/// The exit status produced by any fatal diagnostic.
pub const FATAL_EXIT_CODE: i32 = 1;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DiagnosticCategory {
    Error,
    SecurityError,
    Note,
    Debug,
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub category: DiagnosticCategory,
    pub message: String,
    pub span: Span,
    /// Secondary locations attached via [`Sink::note`] (e.g. "previously defined here").
    pub notes: Vec<(String, Span)>,
}

/// Formats and emits diagnostics against a single [`SourceFile`].
///
/// The sink is the only place in the compiler that prints to stdout/stderr or
/// calls `process::exit`; every pass takes a `&Sink` and routes every
/// diagnosis through it instead of returning `Result`, matching the
/// single-pass, no-recovery error model in the specification.
pub struct Sink<'a> {
    source: &'a SourceFile,
    use_color: bool,
    pending: RefCell<Option<Diagnostic>>,
}

impl<'a> Sink<'a> {
    pub fn new(source: &'a SourceFile) -> Self {
        Sink {
            source,
            use_color: true,
            pending: RefCell::new(None),
        }
    }

    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Record a fatal error and terminate immediately.
    pub fn error(&self, message: impl Into<String>, span: Span) -> ! {
        let diag = Diagnostic {
            category: DiagnosticCategory::Error,
            message: message.into(),
            span,
            notes: Vec::new(),
        };
        self.render(&diag);
        std::process::exit(FATAL_EXIT_CODE);
    }

    /// Record a fatal error but defer rendering so the caller can attach
    /// notes with [`Sink::note`] before calling [`Sink::terminate`].
    pub fn error_continue(&self, message: impl Into<String>, span: Span) {
        *self.pending.borrow_mut() = Some(Diagnostic {
            category: DiagnosticCategory::Error,
            message: message.into(),
            span,
            notes: Vec::new(),
        });
    }

    /// A security-lattice violation: illegal explicit flow, illegal implicit
    /// flow, or a non-high declassification. Always fatal, rendered with a
    /// distinct prefix/color from a plain [`Sink::error`].
    pub fn security_error(&self, message: impl Into<String>, span: Span) -> ! {
        let diag = Diagnostic {
            category: DiagnosticCategory::SecurityError,
            message: message.into(),
            span,
            notes: Vec::new(),
        };
        self.render(&diag);
        std::process::exit(FATAL_EXIT_CODE);
    }

    /// Attach a secondary location to the pending error, e.g. "previously
    /// defined here". Must follow an [`Sink::error_continue`] call.
    pub fn note(&self, message: impl Into<String>, span: Span) {
        let mut pending = self.pending.borrow_mut();
        match pending.as_mut() {
            Some(diag) => diag.notes.push((message.into(), span)),
            None => {
                self.render(&Diagnostic {
                    category: DiagnosticCategory::Note,
                    message: message.into(),
                    span,
                    notes: Vec::new(),
                });
            }
        }
    }

    /// Render the pending diagnostic (with any attached notes) and exit.
    pub fn terminate(&self) -> ! {
        if let Some(diag) = self.pending.borrow_mut().take() {
            self.render(&diag);
        }
        std::process::exit(FATAL_EXIT_CODE);
    }

    /// Non-fatal output for a `debug` statement: the value, its source
    /// location, and an optional epilogue line (e.g. the inferred label).
    pub fn debug(&self, message: impl Into<String>, span: Span, epilogue: Option<&str>) {
        let diag = Diagnostic {
            category: DiagnosticCategory::Debug,
            message: message.into(),
            span,
            notes: epilogue
                .map(|e| vec![(e.to_string(), span)])
                .unwrap_or_default(),
        };
        self.render(&diag);
    }

    fn render(&self, diag: &Diagnostic) {
        let (prefix, colorize): (&str, fn(&str) -> colored::ColoredString) = match diag.category {
            DiagnosticCategory::Error => ("error", |s| s.red().bold()),
            DiagnosticCategory::SecurityError => ("security error", |s| s.magenta().bold()),
            DiagnosticCategory::Note => ("note", |s| s.cyan()),
            DiagnosticCategory::Debug => ("debug", |s| s.blue()),
        };
        let header = format!("{prefix}: {}", diag.message);
        eprintln!("{}", self.colorize(&header, colorize));
        self.render_span(diag.span);
        for (note, span) in &diag.notes {
            eprintln!("{}", self.colorize(&format!("note: {note}"), |s| s.cyan()));
            self.render_span(*span);
        }
    }

    fn colorize(&self, text: &str, f: fn(&str) -> colored::ColoredString) -> String {
        if self.use_color {
            f(text).to_string()
        } else {
            text.to_string()
        }
    }

    /// Renders up to two lines of preamble (the line before, if any) and the
    /// offending line itself, followed by a caret underline for the span.
    /// Tabs are expanded to four spaces so the underline stays aligned.
    fn render_span(&self, span: Span) {
        let (line, col) = self.source.line_col(span.start);
        let (end_line, end_col) = self.source.line_col(span.end.max(span.start));
        let current = self.source.line_text(line);
        // `line_col` counts raw characters; the rendered line has its tabs
        // expanded to four spaces, so the caret's column must be computed
        // from the same expansion or it lands under the wrong character
        // whenever a tab precedes the span (§4.1).
        let expanded_col = expanded_column(current, col);
        let width = if line == end_line {
            let expanded_end_col = expanded_column(current, end_col);
            (expanded_end_col.max(expanded_col + 1)) - expanded_col
        } else {
            1
        };

        if line > 0 {
            eprintln!(" {:>4} | {}", line, expand_tabs(self.source.line_text(line - 1)));
        }
        eprintln!(" {:>4} | {}", line + 1, expand_tabs(current));

        let padding = " ".repeat(expanded_col + " 0000 | ".len());
        let caret = "^".repeat(width.max(1));
        eprintln!("{padding}{}", self.colorize(&caret, |s| s.red().bold()));
    }
}

fn expand_tabs(text: &str) -> String {
    text.replace('\t', "    ")
}

/// The column `raw_col` (a raw character count into `line`) lands at once
/// every tab before it has been expanded to four spaces.
fn expanded_column(line: &str, raw_col: usize) -> usize {
    expand_tabs(&line.chars().take(raw_col).collect::<String>())
        .chars()
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_span_does_not_panic_on_empty_span() {
        let source = SourceFile::new("t.pls", "x := 1;");
        let sink = Sink::new(&source).without_color();
        sink.debug("x", Span::new(0, 1), None);
    }
}
