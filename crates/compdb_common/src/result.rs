//! The per-action failure kind shared by every pipeline stage.

/// Result type for pipeline stages that operate on a single compile action.
///
/// `Err` means the action cannot be normalized safely and must be skipped. It
/// never aborts the run: the orchestrator reports it and moves on to the next
/// action. Recoverable problems are reported as diagnostics and the stage still
/// returns `Ok`.
pub type ActionResult<T> = Result<T, ActionError>;

/// A compile action that cannot be processed.
///
/// Raised when an assumption about the emitting build system does not hold,
/// such as an Apple wrapper macro without a detectable SDK, or a source file
/// that cannot be located by position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("cannot process compile action: {message}")]
pub struct ActionError {
    /// Description of what went wrong, including the offending arguments.
    pub message: String,
}

impl ActionError {
    /// Creates a new action error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<String> for ActionError {
    fn from(message: String) -> Self {
        Self { message }
    }
}
