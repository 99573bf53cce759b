//! Diagnostic emitters.
//!
//! [`TextEmitter`] renders diagnostics as plain text to any writer:
//!
//! ```text
//! error[E2001]: undefined identifier `y'
//!   --> model.mzn:3.5
//!   = help: did you mean `x`?
//! ```

use std::io::{self, Write};

use mzn_ir::{Span, StringInterner};

use crate::{Diagnostic, Severity};

/// Trait for emitting diagnostics in various formats.
pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic);

    fn emit_all(&mut self, diagnostics: &[Diagnostic]) {
        for diag in diagnostics {
            self.emit(diag);
        }
    }

    fn flush(&mut self);

    /// Emit a summary of errors/warnings.
    fn emit_summary(&mut self, error_count: usize, warning_count: usize);
}

/// Plain-text emitter.
pub struct TextEmitter<'a, W: Write> {
    writer: W,
    interner: Option<&'a StringInterner>,
}

impl<'a, W: Write> TextEmitter<'a, W> {
    pub fn new(writer: W) -> Self {
        TextEmitter {
            writer,
            interner: None,
        }
    }

    /// Resolve file names in spans through `interner`.
    #[must_use]
    pub fn with_interner(mut self, interner: &'a StringInterner) -> Self {
        self.interner = Some(interner);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn location(&self, span: Span) -> String {
        let file = self
            .interner
            .map(|i| i.lookup(span.file))
            .filter(|f| !f.is_empty());
        match file {
            Some(file) => format!("{file}:{span}"),
            None => span.to_string(),
        }
    }

    fn write_diagnostic(&mut self, diag: &Diagnostic) -> io::Result<()> {
        writeln!(self.writer, "{}[{}]: {}", diag.severity, diag.code, diag.message)?;
        for label in &diag.labels {
            let loc = self.location(label.span);
            let marker = if label.is_primary { "-->" } else { "   " };
            if label.message.is_empty() {
                writeln!(self.writer, "  {marker} {loc}")?;
            } else {
                writeln!(self.writer, "  {marker} {loc}: {}", label.message)?;
            }
        }
        for note in &diag.notes {
            writeln!(self.writer, "  = note: {note}")?;
        }
        for suggestion in &diag.suggestions {
            writeln!(self.writer, "  = help: {}", suggestion.message)?;
        }
        Ok(())
    }
}

impl<W: Write> DiagnosticEmitter for TextEmitter<'_, W> {
    fn emit(&mut self, diagnostic: &Diagnostic) {
        // Emitting is best-effort; a closed pipe must not abort compilation.
        let _ = self.write_diagnostic(diagnostic);
    }

    fn flush(&mut self) {
        let _ = self.writer.flush();
    }

    fn emit_summary(&mut self, error_count: usize, warning_count: usize) {
        let plural = |n: usize| if n == 1 { "" } else { "s" };
        let _ = match (error_count, warning_count) {
            (0, 0) => Ok(()),
            (e, 0) => writeln!(self.writer, "{e} error{}", plural(e)),
            (0, w) => writeln!(self.writer, "{w} warning{}", plural(w)),
            (e, w) => writeln!(
                self.writer,
                "{e} error{} and {w} warning{}",
                plural(e),
                plural(w)
            ),
        };
    }
}

/// Count errors and warnings in a list of diagnostics.
pub fn count_by_severity(diagnostics: &[Diagnostic]) -> (usize, usize) {
    diagnostics.iter().fold((0, 0), |(e, w), d| match d.severity {
        Severity::Error => (e + 1, w),
        Severity::Warning => (e, w + 1),
        Severity::Note => (e, w),
    })
}
