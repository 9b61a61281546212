//! Diagnostics reported by validation analyses.
//!
//! Diagnostics refer to declarations through their opaque [`DefId`]; turning
//! that into a source location is the job of whoever produced the
//! declarations (see [`crate::report`]).

use std::fmt;

use parking_lot::Mutex;
use serde::Serialize;

use crate::dispatch::DefId;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Error,
    Warning,
    Note,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DiagnosticKind::Error => "error",
            DiagnosticKind::Warning => "warning",
            DiagnosticKind::Note => "note",
        })
    }
}

/// The check a diagnostic comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum DiagnosticCode {
    /// Candidates or entry points with differing parameter counts.
    ArityMismatch,
    /// A primitive parameter type that another candidate cannot be ordered against.
    IncomparablePrimitive,
    /// A candidate return type not assignable to an entry point's return type.
    IncompatibleReturn,
    /// A dispatch point shadowing a method inherited from the root type.
    RootMethodCollision,
    /// Specificity that depends on type arguments invisible at run time.
    GenericDispatch,
    /// A module reference whose type is not a dispatch module.
    InvalidModuleReference,
}

impl DiagnosticCode {
    /// Stable code string, e.g. `D0001`.
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticCode::ArityMismatch => "D0001",
            DiagnosticCode::IncomparablePrimitive => "D0002",
            DiagnosticCode::IncompatibleReturn => "D0003",
            DiagnosticCode::RootMethodCollision => "D0004",
            DiagnosticCode::GenericDispatch => "D0005",
            DiagnosticCode::InvalidModuleReference => "D0006",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validation failure (or note) about one declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// Severity.
    pub kind: DiagnosticKind,
    /// The check that produced it.
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// The offending declaration.
    pub def_id: Option<DefId>,
    /// The offending parameter position, when there is one.
    pub position: Option<usize>,
    /// Other declarations involved, with a short explanation each.
    pub related: Vec<(DefId, String)>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            kind: DiagnosticKind::Error,
            code,
            message: message.into(),
            def_id: None,
            position: None,
            related: Vec::new(),
        }
    }

    /// Attach the offending declaration.
    pub fn at(mut self, def_id: DefId) -> Self {
        self.def_id = Some(def_id);
        self
    }

    /// Attach the offending parameter position.
    pub fn at_position(mut self, position: usize) -> Self {
        self.position = Some(position);
        self
    }

    /// Add a related declaration.
    pub fn with_related(mut self, def_id: DefId, note: impl Into<String>) -> Self {
        self.related.push((def_id, note.into()));
        self
    }

    /// Whether this is an error.
    pub fn is_error(&self) -> bool {
        self.kind == DiagnosticKind::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.kind, self.code, self.message)
    }
}

/// Append-only diagnostic sink shared by concurrent resolutions.
///
/// Each dispatch point's diagnostics are flushed as one batch, so they stay
/// contiguous even when points are resolved in parallel.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch of diagnostics under a single lock.
    pub fn flush(&self, batch: Vec<Diagnostic>) {
        if batch.is_empty() {
            return;
        }
        self.diagnostics.lock().extend(batch);
    }

    /// Number of error diagnostics reported so far.
    pub fn error_count(&self) -> usize {
        self.diagnostics.lock().iter().filter(|d| d.is_error()).count()
    }

    /// Whether any error was reported.
    pub fn has_errors(&self) -> bool {
        self.error_count() > 0
    }

    /// Copy of everything reported so far.
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.diagnostics.lock().clone()
    }

    /// Take everything reported so far, leaving the sink empty.
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.diagnostics.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let diag = Diagnostic::error(DiagnosticCode::ArityMismatch, "expected 2 parameters")
            .at(DefId::new(3));
        assert_eq!(diag.to_string(), "error[D0001]: expected 2 parameters");
        assert_eq!(diag.def_id, Some(DefId::new(3)));
    }

    #[test]
    fn test_sink_batches_stay_contiguous() {
        let sink = DiagnosticSink::new();
        crossbeam_utils::thread::scope(|scope| {
            for worker in 0..4u32 {
                let sink = &sink;
                scope.spawn(move |_| {
                    let batch = (0..3)
                        .map(|_| {
                            Diagnostic::error(DiagnosticCode::GenericDispatch, "x")
                                .at(DefId::new(worker))
                        })
                        .collect();
                    sink.flush(batch);
                });
            }
        })
        .unwrap();

        let all = sink.take();
        assert_eq!(all.len(), 12);
        for chunk in all.chunks(3) {
            assert!(chunk.iter().all(|d| d.def_id == chunk[0].def_id));
        }
        assert!(!sink.has_errors());
    }
}
