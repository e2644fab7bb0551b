//! Error types for cache operations.

use std::path::PathBuf;

/// Errors that can occur while writing header cache files.
///
/// Reads are fail-safe: an unreadable or undecodable entry is a cache miss,
/// not an error. This enum covers the write path, whose failures are logged
/// and otherwise ignored by callers.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// An I/O error occurred while reading or writing cache files.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        /// The path that caused the error.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {reason}")]
    Serialization {
        /// Description of the serialization failure.
        reason: String,
    },
}
