//! Per-session diagnostic accumulator.

use crate::code::DiagnosticCode;
use crate::diagnostic::Diagnostic;
use crate::severity::Severity;
use std::cell::{Cell, RefCell};

/// Collects the diagnostics emitted by one mapping session.
///
/// A session is single-threaded, so emission goes through shared references
/// with interior mutability. Counts are kept per severity so summaries don't
/// need to walk the list.
#[derive(Default)]
pub struct DiagnosticSink {
    diagnostics: RefCell<Vec<Diagnostic>>,
    counts: [Cell<usize>; 3],
}

fn slot(severity: Severity) -> usize {
    match severity {
        Severity::Note => 0,
        Severity::Warning => 1,
        Severity::Error => 2,
    }
}

impl DiagnosticSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a diagnostic.
    pub fn emit(&self, diag: Diagnostic) {
        let counter = &self.counts[slot(diag.severity)];
        counter.set(counter.get() + 1);
        self.diagnostics.borrow_mut().push(diag);
    }

    /// Number of diagnostics of `severity` emitted since the last clear.
    pub fn count(&self, severity: Severity) -> usize {
        self.counts[slot(severity)].get()
    }

    /// Whether any error was emitted since the last clear.
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    /// Drains the recorded diagnostics. Counts are kept.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        self.diagnostics.take()
    }

    /// A copy of the recorded diagnostics.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// The recorded diagnostics carrying `code`.
    pub fn with_code(&self, code: DiagnosticCode) -> Vec<Diagnostic> {
        self.diagnostics
            .borrow()
            .iter()
            .filter(|d| d.code == code)
            .cloned()
            .collect()
    }

    /// Drops every diagnostic and resets the counts.
    pub fn clear(&self) {
        self.diagnostics.borrow_mut().clear();
        for c in &self.counts {
            c.set(0);
        }
    }
}

impl std::fmt::Debug for DiagnosticSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiagnosticSink")
            .field("errors", &self.count(Severity::Error))
            .field("warnings", &self.count(Severity::Warning))
            .field("notes", &self.count(Severity::Note))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Category;

    const UNPLACED: DiagnosticCode = DiagnosticCode::new(Category::Placement, 201);

    #[test]
    fn counts_by_severity() {
        let sink = DiagnosticSink::new();
        assert!(!sink.has_errors());
        sink.emit(Diagnostic::warning(UNPLACED, "g0 left unmapped"));
        sink.emit(Diagnostic::warning(UNPLACED, "g1 left unmapped"));
        sink.emit(Diagnostic::note(
            DiagnosticCode::new(Category::Placement, 202),
            "no FPGA has architecture virtex6",
        ));
        assert_eq!(sink.count(Severity::Warning), 2);
        assert_eq!(sink.count(Severity::Note), 1);
        assert!(!sink.has_errors());

        sink.emit(Diagnostic::error(
            DiagnosticCode::new(Category::Error, 111),
            "no common architecture",
        ));
        assert!(sink.has_errors());
    }

    #[test]
    fn with_code_filters() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning(UNPLACED, "g0 left unmapped").with_subject("g0"));
        sink.emit(Diagnostic::warning(
            DiagnosticCode::new(Category::Routing, 301),
            "no path",
        ));
        let unplaced = sink.with_code(UNPLACED);
        assert_eq!(unplaced.len(), 1);
        assert_eq!(unplaced[0].subject.as_deref(), Some("g0"));
    }

    #[test]
    fn take_all_drains_but_keeps_counts() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::warning(UNPLACED, "a"));
        assert_eq!(sink.take_all().len(), 1);
        assert!(sink.diagnostics().is_empty());
        assert_eq!(sink.count(Severity::Warning), 1);
    }

    #[test]
    fn clear_resets_everything() {
        let sink = DiagnosticSink::new();
        sink.emit(Diagnostic::error(DiagnosticCode::new(Category::Error, 101), "dup"));
        sink.clear();
        assert!(!sink.has_errors());
        assert!(sink.diagnostics().is_empty());
    }
}
