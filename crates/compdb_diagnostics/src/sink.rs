//! Thread-safe diagnostic accumulator shared by extraction workers.

use crate::diagnostic::Diagnostic;
use crate::once::{OnceKind, WarnOnce};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// A thread-safe accumulator for diagnostics emitted while processing actions.
///
/// Each worker emits its advisories as complete values, so output from
/// concurrent actions is never interleaved. The error count is tracked
/// atomically for fast `has_errors` checks without locking.
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
    error_count: AtomicUsize,
    once: WarnOnce,
}

impl DiagnosticSink {
    /// Creates a new empty diagnostic sink.
    pub fn new() -> Self {
        Self {
            diagnostics: Mutex::new(Vec::new()),
            error_count: AtomicUsize::new(0),
            once: WarnOnce::new(),
        }
    }

    /// Emits a diagnostic into the sink.
    pub fn emit(&self, diag: Diagnostic) {
        if diag.severity.is_error() {
            self.error_count.fetch_add(1, Ordering::Relaxed);
        }
        self.lock().push(diag);
    }

    /// Emits `diag` only if `kind` hasn't fired yet this run.
    ///
    /// The diagnostic is built lazily so callers don't pay for formatting a
    /// message that will be dropped. Returns `true` if it was emitted.
    pub fn emit_once(&self, kind: OnceKind, diag: impl FnOnce() -> Diagnostic) -> bool {
        if !self.once.first(kind) {
            return false;
        }
        self.emit(diag());
        true
    }

    /// The run-wide warn-once gate.
    pub fn once(&self) -> &WarnOnce {
        &self.once
    }

    /// Returns `true` if any error-severity diagnostics have been emitted.
    pub fn has_errors(&self) -> bool {
        self.error_count.load(Ordering::Relaxed) > 0
    }

    /// Returns the number of error-severity diagnostics emitted so far.
    pub fn error_count(&self) -> usize {
        self.error_count.load(Ordering::Relaxed)
    }

    /// Takes all accumulated diagnostics, leaving the sink empty.
    pub fn take_all(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.lock())
    }

    /// Returns a snapshot of all accumulated diagnostics without draining.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Diagnostic>> {
        self.diagnostics
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for DiagnosticSink {
    fn default() -> Self {
        Self::new()
    }
}
