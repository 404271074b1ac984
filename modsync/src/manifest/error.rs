//! Error types for manifest retrieval.

use thiserror::Error;

/// Result type for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// The remote manifest could not be obtained.
///
/// Both variants abort the reconciliation pass that requested the listing
/// and leave the previous installer state untouched.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The listing could not be fetched.
    #[error("manifest unavailable at {url}: {reason}")]
    Unavailable { url: String, reason: String },

    /// The listing was fetched but could not be decoded.
    #[error("failed to parse manifest from {url}: {reason}")]
    Parse { url: String, reason: String },
}
