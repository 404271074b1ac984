//! Local filesystem collaborators: probing existing files and writing new ones.

mod fs;
mod info;

pub use fs::LocalFs;
pub use info::LocalFileInfo;

use std::io;
use std::path::Path;
use std::pin::Pin;

use tokio::io::AsyncWrite;

use crate::BoxFuture;

/// Write sink for one file.
///
/// A chunk counts as written once `write_all` on the sink has completed.
pub type WriteSink = Pin<Box<dyn AsyncWrite + Send>>;

/// Inspects local files.
pub trait FileProber: Send + Sync {
    /// Probe `path`.
    ///
    /// Returns `None` when the file is absent, is not a regular file, or
    /// cannot be inspected.
    fn probe<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Option<LocalFileInfo>>;
}

/// Creates local write sinks.
pub trait FileWriter: Send + Sync {
    /// Create (or truncate) the file at `path` and return a sink for it.
    fn create_sink<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<WriteSink>>;
}
