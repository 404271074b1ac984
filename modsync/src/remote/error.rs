//! Error types for remote storage backends.

use thiserror::Error;

/// Result type for remote storage operations.
pub type RemoteResult<T> = Result<T, RemoteError>;

/// Errors raised while retrieving file contents.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    /// The stream for a file could not be opened.
    #[error("failed to open {path}: {reason}")]
    Open { path: String, reason: String },

    /// The stream failed after it was opened.
    #[error("stream for {path} failed: {reason}")]
    Stream { path: String, reason: String },
}

impl RemoteError {
    /// Remote path the error refers to.
    pub fn path(&self) -> &str {
        match self {
            Self::Open { path, .. } | Self::Stream { path, .. } => path,
        }
    }
}
