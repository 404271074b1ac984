//! Reconciliation: compare the remote manifest with the local tree.
//!
//! ```text
//! ManifestSource::list_files()
//!        │
//!        ▼
//!   scope (shared + selected version, safe paths only)
//!        │
//!        ▼
//!   FileProber::probe() per file ──► reconcile_entry() ──► FileStatus
//!        │
//!        ▼
//!   Reconciliation { files, statuses, size, loaded, ready }
//! ```

use std::path::Path;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::state::{percent, FileStatus, InstallerState};
use crate::local::{FileProber, LocalFileInfo};
use crate::manifest::{ManifestResult, ManifestSource, RemoteFileDescriptor, VersionDescriptor};

/// Whether a local copy satisfies a remote descriptor.
///
/// The local file must exist, have exactly the remote size, and be at least as
/// new as the remote copy.
pub fn is_up_to_date(remote: &RemoteFileDescriptor, local: Option<&LocalFileInfo>) -> bool {
    match local {
        Some(local) => local.size == remote.size && local.modified >= remote.modified,
        None => false,
    }
}

/// Build the status record for one in-scope file from its probe result.
pub fn reconcile_entry(
    remote: &RemoteFileDescriptor,
    root: &Path,
    local: Option<&LocalFileInfo>,
) -> FileStatus {
    let ready = is_up_to_date(remote, local);
    let loaded = if ready { remote.size } else { 0 };
    FileStatus {
        id: remote.id.clone(),
        name: remote.path.clone(),
        local: remote.local_path(root),
        size: remote.size,
        loaded,
        ready,
        progress: percent(loaded, remote.size, ready),
        error: false,
        transfer: None,
    }
}

/// Restrict a manifest listing to the files that belong to `version`.
///
/// Files with paths escaping the installation root are dropped.
pub fn scope_files(
    files: Vec<RemoteFileDescriptor>,
    version: Option<&VersionDescriptor>,
) -> Vec<RemoteFileDescriptor> {
    files
        .into_iter()
        .filter(|file| {
            if !file.has_safe_path() {
                warn!(path = %file.path, "Skipping manifest entry with unsafe path");
                return false;
            }
            file.is_in_scope(version)
        })
        .collect()
}

/// Result of one reconciliation pass.
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    /// In-scope descriptors, aligned with `statuses`.
    pub files: Vec<RemoteFileDescriptor>,
    /// Per-file status, in manifest order.
    pub statuses: Vec<FileStatus>,
    /// Sum of all in-scope sizes.
    pub size: u64,
    /// Sum of the sizes of ready files.
    pub loaded: u64,
    /// Every in-scope file is ready.
    pub ready: bool,
}

impl Reconciliation {
    /// Assemble a reconciliation from scoped descriptors and their statuses.
    pub fn new(files: Vec<RemoteFileDescriptor>, statuses: Vec<FileStatus>) -> Self {
        let size = statuses.iter().map(|s| s.size).sum();
        let loaded = statuses.iter().map(|s| s.loaded).sum();
        let ready = statuses.iter().all(|s| s.ready);
        Self {
            files,
            statuses,
            size,
            loaded,
            ready,
        }
    }

    /// Number of files that need a transfer.
    pub fn pending(&self) -> usize {
        self.statuses.iter().filter(|s| !s.ready).count()
    }

    /// Copy the result into the installer state.
    ///
    /// Replaces the file list, the aggregates, and clears `error`.
    pub fn apply(&self, state: &mut InstallerState) {
        state.files = self.statuses.clone();
        state.size = self.size;
        state.loaded = self.loaded;
        state.ready = self.ready;
        state.error = false;
        state.speed = 0;
        state.recompute_progress();
    }
}

/// Compares the manifest with the local installation.
#[derive(Clone)]
pub struct Reconciler {
    manifest: Arc<dyn ManifestSource>,
    prober: Arc<dyn FileProber>,
}

impl Reconciler {
    /// Create a reconciler over the given collaborators.
    pub fn new(manifest: Arc<dyn ManifestSource>, prober: Arc<dyn FileProber>) -> Self {
        Self { manifest, prober }
    }

    /// Run one reconciliation pass for `root` and the selected `version`.
    ///
    /// The manifest is fetched fresh and every in-scope file is probed.
    pub async fn check(
        &self,
        root: &Path,
        version: Option<&VersionDescriptor>,
    ) -> ManifestResult<Reconciliation> {
        let listing = self.manifest.list_files().await.map_err(|e| {
            warn!(error = %e, "Manifest listing failed");
            e
        })?;
        let total = listing.len();
        let files = scope_files(listing, version);

        debug!(
            listed = total,
            in_scope = files.len(),
            version = version.map(|v| v.id.as_str()),
            "Scoped manifest"
        );

        let paths: Vec<_> = files.iter().map(|f| f.local_path(root)).collect();
        let probes = join_all(paths.iter().map(|p| self.prober.probe(p))).await;

        let statuses = files
            .iter()
            .zip(probes.iter())
            .map(|(file, probe)| reconcile_entry(file, root, probe.as_ref()))
            .collect();

        let result = Reconciliation::new(files, statuses);
        info!(
            root = %root.display(),
            files = result.statuses.len(),
            pending = result.pending(),
            size = result.size,
            loaded = result.loaded,
            ready = result.ready,
            "Reconciliation complete"
        );
        Ok(result)
    }
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler").finish_non_exhaustive()
    }
}
