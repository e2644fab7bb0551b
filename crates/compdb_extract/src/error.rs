//! Errors that stop an extraction run before any action is processed.

/// Failures outside any single action.
///
/// Per-action problems never surface here; they become diagnostics and the
/// action is skipped.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// The action graph is not valid JSON or has the wrong shape.
    #[error("invalid action graph: {0}")]
    ActionGraph(#[from] serde_json::Error),

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    WorkerPool(#[from] rayon::ThreadPoolBuildError),
}
