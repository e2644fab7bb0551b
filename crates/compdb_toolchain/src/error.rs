//! Error types for host queries and process execution.

/// Errors raised while spawning processes or querying the host toolchain.
#[derive(Debug, thiserror::Error)]
pub enum ToolchainError {
    /// An invocation with no program was requested.
    #[error("cannot run an empty command")]
    EmptyCommand,

    /// The program could not be started.
    #[error("failed to run '{program}': {source}")]
    Spawn {
        /// The program that failed to start.
        program: String,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A command line was too long and spilling it to a parameter file failed.
    #[error("failed to write parameter file: {0}")]
    ParamFile(#[source] std::io::Error),

    /// A host query ran but did not produce a usable answer.
    #[error("'{query}' failed: {reason}")]
    Lookup {
        /// The command line that was run.
        query: String,
        /// What went wrong.
        reason: String,
    },
}

impl From<ToolchainError> for compdb_common::ActionError {
    fn from(err: ToolchainError) -> Self {
        compdb_common::ActionError::new(err.to_string())
    }
}
