//! Filesystem-backed prober and writer.

use std::io;
use std::path::Path;

use tracing::debug;

use super::{FileProber, FileWriter, LocalFileInfo, WriteSink};
use crate::BoxFuture;

/// Prober and writer over the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new filesystem collaborator.
    pub fn new() -> Self {
        Self
    }
}

impl FileProber for LocalFs {
    fn probe<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Option<LocalFileInfo>> {
        Box::pin(async move {
            match tokio::fs::metadata(path).await {
                Ok(metadata) => LocalFileInfo::from_metadata(&metadata),
                Err(e) if e.kind() == io::ErrorKind::NotFound => None,
                Err(e) => {
                    debug!(path = %path.display(), error = %e, "Probe failed, treating as absent");
                    None
                }
            }
        })
    }
}

impl FileWriter for LocalFs {
    fn create_sink<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, io::Result<WriteSink>> {
        Box::pin(async move {
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let file = tokio::fs::File::create(path).await?;
            Ok(Box::pin(file) as WriteSink)
        })
    }
}
