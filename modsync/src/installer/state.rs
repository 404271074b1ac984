//! Installer state: the aggregate snapshot pushed to the observer.
//!
//! [`InstallerState`] is mutated in place by every operation. Per-file
//! [`FileStatus`] records are rebuilt by each reconciliation pass and updated
//! chunk by chunk while transfers run.

use std::path::PathBuf;

use serde::Serialize;

use crate::manifest::VersionDescriptor;

/// Percentage of `loaded` over `size`, in the range 0-100.
///
/// An empty total counts as complete only when `ready`.
pub(crate) fn percent(loaded: u64, size: u64, ready: bool) -> f64 {
    if size == 0 {
        return if ready { 100.0 } else { 0.0 };
    }
    (loaded.min(size) as f64 / size as f64) * 100.0
}

/// Transient bookkeeping that exists only while a file is transferring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActiveTransfer {
    /// Bytes written since the last throughput sample.
    pub recorded: u64,
    /// Bytes written during the last full sample period.
    pub speed: u64,
}

/// Readiness and progress of one manifest file.
///
/// Invariant: `ready` implies `loaded == size` and `progress == 100`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileStatus {
    /// Backend identifier of the remote file.
    pub id: String,
    /// Relative manifest path, used as the display name.
    pub name: String,
    /// Absolute local destination.
    pub local: PathBuf,
    /// Expected size in bytes.
    pub size: u64,
    /// Bytes confirmed written.
    pub loaded: u64,
    /// Whether the local copy matches the manifest.
    pub ready: bool,
    /// Progress percentage (0-100).
    pub progress: f64,
    /// Whether the last transfer of this file failed.
    pub error: bool,
    /// Present only while the file is transferring.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer: Option<ActiveTransfer>,
}

impl FileStatus {
    /// Whether the file is currently transferring.
    pub fn is_downloading(&self) -> bool {
        self.transfer.is_some()
    }

    /// Bytes per second observed during the last sample, 0 when idle.
    pub fn speed(&self) -> u64 {
        self.transfer.map(|t| t.speed).unwrap_or(0)
    }

    pub(crate) fn recompute_progress(&mut self) {
        self.progress = percent(self.loaded, self.size, self.ready);
    }

    pub(crate) fn mark_ready(&mut self) {
        self.ready = true;
        self.loaded = self.size;
        self.progress = 100.0;
    }
}

/// Aggregate installer state.
///
/// Created with every flag cleared, then mutated in place for the lifetime of
/// the engine. Observers receive a reference to this same object after every
/// mutation and must not assume it stays unchanged between notifications.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct InstallerState {
    /// A reconciliation pass is running.
    pub initializing: bool,
    /// An install is running.
    pub downloading: bool,
    /// Every in-scope file is ready.
    pub ready: bool,
    /// At least one file failed its last transfer.
    pub error: bool,
    /// Aggregate bytes per second over the last sample.
    pub speed: u64,
    /// Aggregate progress percentage (0-100).
    pub progress: f64,
    /// Aggregate bytes loaded.
    pub loaded: u64,
    /// Aggregate size of all in-scope files.
    pub size: u64,
    /// Per-file status in manifest order.
    pub files: Vec<FileStatus>,
    /// Versions offered by the manifest.
    pub versions: Vec<VersionDescriptor>,
    /// Selected version identifier.
    pub version: Option<String>,
    /// Local installation root.
    pub directory: PathBuf,
    /// Label of the remote root.
    pub host: String,
}

impl InstallerState {
    /// Descriptor of the selected version, if it is offered by the manifest.
    pub fn selected_version(&self) -> Option<&VersionDescriptor> {
        let id = self.version.as_deref()?;
        self.versions.iter().find(|v| v.id == id)
    }

    /// Files that still need a transfer.
    pub fn pending_files(&self) -> impl Iterator<Item = &FileStatus> {
        self.files.iter().filter(|f| !f.ready)
    }

    /// Number of files currently transferring.
    pub fn active_transfers(&self) -> usize {
        self.files.iter().filter(|f| f.is_downloading()).count()
    }

    pub(crate) fn recompute_progress(&mut self) {
        self.progress = percent(self.loaded, self.size, self.ready);
    }

    /// Recompute `ready` and `error` from the per-file flags.
    ///
    /// `ready` is a logical AND over the files, `error` a logical OR.
    pub(crate) fn recompute_flags(&mut self) {
        self.ready = self.files.iter().all(|f| f.ready);
        self.error = self.files.iter().any(|f| f.error);
    }

    /// Move every transferring file's accumulator into its speed.
    ///
    /// Aggregate speed becomes the sum of the per-file speeds.
    pub(crate) fn sample_throughput(&mut self) {
        self.speed = 0;
        for file in &mut self.files {
            if let Some(transfer) = file.transfer.as_mut() {
                transfer.speed = transfer.recorded;
                transfer.recorded = 0;
                self.speed += transfer.speed;
            }
        }
        self.recompute_progress();
    }

    /// Stop-of-transfer bookkeeping shared by cancellation and completion.
    pub(crate) fn halt(&mut self) {
        self.downloading = false;
        self.speed = 0;
        self.recompute_progress();
        self.recompute_flags();
    }
}
