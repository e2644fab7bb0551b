//! Structured advisory messages with severity, codes, notes, and raw detail.

use std::fmt;

use crate::code::DiagnosticCode;

/// The severity level of a diagnostic message.
///
/// Ordered from least to most severe by declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub enum Severity {
    /// Progress information.
    Info,
    /// A completed step.
    Success,
    /// A recoverable problem; processing continued.
    Warning,
    /// An action was dropped from the output.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A structured advisory message.
///
/// `notes` are short explanatory lines shown with the message. `detail` carries
/// raw text the user may need verbatim (compiler stderr, the contents of a
/// corrupted cache file) and is rendered without decoration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The severity level of this diagnostic.
    pub severity: Severity,
    /// The code identifying the kind of advisory, if any.
    pub code: Option<DiagnosticCode>,
    /// The main message.
    pub message: String,
    /// Explanatory lines shown beneath the message.
    pub notes: Vec<String>,
    /// Raw, undecorated text appended after the message.
    pub detail: Option<String>,
}

impl Diagnostic {
    fn new(severity: Severity, code: Option<DiagnosticCode>, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            message: message.into(),
            notes: Vec::new(),
            detail: None,
        }
    }

    /// Creates an informational message.
    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, None, message)
    }

    /// Creates a success message.
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, None, message)
    }

    /// Creates a warning with the given code.
    pub fn warning(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, Some(code), message)
    }

    /// Creates an error with the given code.
    pub fn error(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, Some(code), message)
    }

    /// Adds an explanatory note.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Attaches raw detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
