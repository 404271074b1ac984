//! Error types for the installer engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::manifest::ManifestError;
use crate::remote::RemoteError;

/// Result type for installer operations.
pub type InstallerResult<T> = Result<T, InstallerError>;

/// Result type for a single file transfer.
pub type TransferResult<T> = Result<T, TransferError>;

/// Errors returned by installer operations.
///
/// Per-file transfer failures are not returned here; they are recorded on the
/// file's status and reported through the error callback.
#[derive(Debug, Error)]
pub enum InstallerError {
    /// The remote manifest could not be listed.
    #[error(transparent)]
    Manifest(#[from] ManifestError),
}

/// Why a single file transfer ended without completing.
#[derive(Debug, Error)]
pub enum TransferError {
    /// The remote stream could not be opened.
    #[error("failed to open remote file {path}: {reason}")]
    Open { path: String, reason: String },

    /// The local sink could not be created or written.
    #[error("failed to write {}: {source}", path.display())]
    Sink {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The remote stream failed mid-transfer.
    #[error("transfer of {path} failed: {reason}")]
    Stream { path: String, reason: String },

    /// The transfer was terminated by a cancellation request.
    #[error("transfer cancelled")]
    Cancelled,
}

impl TransferError {
    /// Whether the transfer ended because of cancellation rather than failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub(crate) fn sink(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Sink {
            path: path.into(),
            source,
        }
    }
}

impl From<RemoteError> for TransferError {
    fn from(err: RemoteError) -> Self {
        match err {
            RemoteError::Open { path, reason } => Self::Open { path, reason },
            RemoteError::Stream { path, reason } => Self::Stream { path, reason },
        }
    }
}
