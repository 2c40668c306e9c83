//! Structured diagnostics and the sinks that collect/render them.
//!
//! Every stage of the compiler reports failures and warnings through a
//! [`Diagnostic`] rather than formatting strings ad hoc, so that a caller
//! can choose to log them (`LogSink`, used by the `vac` binary), collect
//! them for a test assertion (`VecSink`), or render them with a caret
//! underline (`Diagnostic::render`), matching the teacher's
//! `parser::ParseError` `Display` impl.

use std::fmt;

use colored::Colorize;

use crate::source::{SourceCache, Span};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub primary: Option<Span>,
    pub notes: Vec<(Span, String)>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, primary: Span) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            primary: Some(primary),
            notes: Vec::new(),
        }
    }

    pub fn warning(message: impl Into<String>, primary: Span) -> Self {
        Self {
            severity: Severity::Warning,
            message: message.into(),
            primary: Some(primary),
            notes: Vec::new(),
        }
    }

    pub fn info(message: impl Into<String>, primary: Span) -> Self {
        Self {
            severity: Severity::Info,
            message: message.into(),
            primary: Some(primary),
            notes: Vec::new(),
        }
    }

    pub fn without_location(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            primary: None,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, at: Span, note: impl Into<String>) -> Self {
        self.notes.push((at, note.into()));
        self
    }

    /// Render as `FILE:LINE:COL: {error|warning|info}: message`, followed
    /// by the offending source line and a caret underline (§6).
    pub fn render(&self, cache: &SourceCache) -> String {
        let mut out = String::new();

        let Some(span) = self.primary else {
            out.push_str(&format!("{}: {}", self.severity, self.message));
            return out;
        };

        let path = cache.path(span.file);
        out.push_str(&format!(
            "{}:{}:{}: {}: {}\n",
            path.display(),
            span.line,
            span.column,
            self.severity,
            self.message
        ));

        if let Some(line) = cache.line(span.file, span.line) {
            let underline_len = span.length.max(1);
            let caret = "^".repeat(underline_len).red();
            let padding = " ".repeat(span.column.saturating_sub(1));
            out.push_str(&format!("{line}\n{padding}{caret}\n"));
        }

        for (note_span, note) in &self.notes {
            out.push_str(&format!(
                "{}:{}:{}: info: {}\n",
                cache.path(note_span.file).display(),
                note_span.line,
                note_span.column,
                note
            ));
        }

        out
    }
}

/// Where diagnostics produced by a compile go.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);

    fn has_errors(&self) -> bool;
}

/// In-memory sink, used by tests and by library callers driving the
/// compiler interactively.
#[derive(Default, Debug, Clone)]
pub struct VecSink {
    pub diagnostics: Vec<Diagnostic>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }
}

impl DiagnosticSink for VecSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }
}

/// Sink that forwards every diagnostic to the `log` facade, rendered with
/// source context. Used by the `vac` binary; the library never installs a
/// logger itself (§9: no global singletons).
pub struct LogSink<'a> {
    cache: &'a SourceCache,
    error_count: usize,
}

impl<'a> LogSink<'a> {
    pub fn new(cache: &'a SourceCache) -> Self {
        Self {
            cache,
            error_count: 0,
        }
    }
}

impl DiagnosticSink for LogSink<'_> {
    fn report(&mut self, diagnostic: Diagnostic) {
        let rendered = diagnostic.render(self.cache);
        match diagnostic.severity {
            Severity::Error => {
                self.error_count += 1;
                log::error!("{rendered}");
            }
            Severity::Warning => log::warn!("{rendered}"),
            Severity::Info => log::info!("{rendered}"),
        }
    }

    fn has_errors(&self) -> bool {
        self.error_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vec_sink_tracks_errors() {
        let cache = SourceCache::new();
        let file = cache.insert("a.va", "let x = 1;".to_owned());
        let mut sink = VecSink::new();
        sink.report(Diagnostic::warning("unused", Span::new(file, 1, 1, 0, 3)));
        assert!(!sink.has_errors());
        sink.report(Diagnostic::error("boom", Span::new(file, 1, 1, 0, 3)));
        assert!(sink.has_errors());
    }

    #[test]
    fn render_includes_caret() {
        let cache = SourceCache::new();
        let file = cache.insert("a.va", "let x = ;".to_owned());
        let diag = Diagnostic::error("unexpected token", Span::new(file, 1, 9, 8, 1));
        let rendered = diag.render(&cache);
        assert!(rendered.contains("a.va:1:9: error: unexpected token"));
        assert!(rendered.contains("let x = ;"));
    }
}
