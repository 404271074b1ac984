//! Optional hooks invoked during an install.

use super::error::TransferError;
use super::state::{FileStatus, InstallerState};

/// Callback receiving the aggregate state.
pub type StateCallback = Box<dyn FnMut(&InstallerState) + Send>;

/// Callback receiving a single file's status.
pub type FileCallback = Box<dyn FnMut(&FileStatus) + Send>;

/// Callback receiving a failed file and the reason it failed.
pub type FileErrorCallback = Box<dyn FnMut(&FileStatus, &TransferError) + Send>;

/// Hooks for a single install run.
///
/// Every hook is optional. Hooks run on the engine's event loop, so they must
/// return quickly.
///
/// # Example
///
/// ```
/// use modsync::InstallCallbacks;
///
/// let callbacks = InstallCallbacks::new()
///     .on_file_complete(|file| println!("{} ready", file.name))
///     .on_file_error(|file, err| eprintln!("{}: {}", file.name, err));
/// ```
#[derive(Default)]
pub struct InstallCallbacks {
    begin: Option<StateCallback>,
    file_progress: Option<FileCallback>,
    file_complete: Option<FileCallback>,
    file_error: Option<FileErrorCallback>,
    complete: Option<StateCallback>,
}

impl InstallCallbacks {
    /// Create an empty set of hooks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Called once the install has started.
    pub fn on_begin(mut self, f: impl FnMut(&InstallerState) + Send + 'static) -> Self {
        self.begin = Some(Box::new(f));
        self
    }

    /// Called whenever a file's progress changes.
    pub fn on_file_progress(mut self, f: impl FnMut(&FileStatus) + Send + 'static) -> Self {
        self.file_progress = Some(Box::new(f));
        self
    }

    /// Called when a file finished transferring successfully.
    pub fn on_file_complete(mut self, f: impl FnMut(&FileStatus) + Send + 'static) -> Self {
        self.file_complete = Some(Box::new(f));
        self
    }

    /// Called when a file's transfer failed.
    pub fn on_file_error(
        mut self,
        f: impl FnMut(&FileStatus, &TransferError) + Send + 'static,
    ) -> Self {
        self.file_error = Some(Box::new(f));
        self
    }

    /// Called once every transfer has settled.
    pub fn on_complete(mut self, f: impl FnMut(&InstallerState) + Send + 'static) -> Self {
        self.complete = Some(Box::new(f));
        self
    }

    pub(crate) fn begin(&mut self, state: &InstallerState) {
        if let Some(cb) = self.begin.as_mut() {
            cb(state);
        }
    }

    pub(crate) fn file_progress(&mut self, file: &FileStatus) {
        if let Some(cb) = self.file_progress.as_mut() {
            cb(file);
        }
    }

    pub(crate) fn file_complete(&mut self, file: &FileStatus) {
        if let Some(cb) = self.file_complete.as_mut() {
            cb(file);
        }
    }

    pub(crate) fn file_error(&mut self, file: &FileStatus, err: &TransferError) {
        if let Some(cb) = self.file_error.as_mut() {
            cb(file, err);
        }
    }

    pub(crate) fn complete(&mut self, state: &InstallerState) {
        if let Some(cb) = self.complete.as_mut() {
            cb(state);
        }
    }
}

impl std::fmt::Debug for InstallCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallCallbacks")
            .field("begin", &self.begin.is_some())
            .field("file_progress", &self.file_progress.is_some())
            .field("file_complete", &self.file_complete.is_some())
            .field("file_error", &self.file_error.is_some())
            .field("complete", &self.complete.is_some())
            .finish()
    }
}
