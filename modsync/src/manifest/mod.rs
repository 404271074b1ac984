//! Remote manifest: installable versions and the files that make them up.
//!
//! A manifest is a flat listing of [`RemoteFileDescriptor`]s. Files rooted
//! under the `Versions/<directory>/` namespace belong to one
//! [`VersionDescriptor`]; everything else is shared by all versions.

mod error;
mod http;
mod types;

pub use error::{ManifestError, ManifestResult};
pub use http::HttpManifestSource;
pub use types::{RemoteFileDescriptor, VersionDescriptor, VERSIONS_NAMESPACE};

use crate::BoxFuture;

/// Source of the remote manifest.
///
/// Implementations fetch the listing fresh on every call; the reconciler
/// never caches it between passes.
pub trait ManifestSource: Send + Sync {
    /// Human-readable label of the remote root (host name or URL).
    fn host(&self) -> String;

    /// List the installable versions.
    fn list_versions(&self) -> BoxFuture<'_, ManifestResult<Vec<VersionDescriptor>>>;

    /// List every file known to the manifest, across all versions.
    ///
    /// Scoping to the selected version is done by the reconciler.
    fn list_files(&self) -> BoxFuture<'_, ManifestResult<Vec<RemoteFileDescriptor>>>;
}
