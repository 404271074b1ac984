//! Local file probe result.

use std::fs::Metadata;

use chrono::{DateTime, Utc};

/// Size and modification time of a local file.
///
/// Produced fresh on every probe; absence is expressed as `Option::None` by
/// the prober rather than a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalFileInfo {
    /// Size in bytes.
    pub size: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl LocalFileInfo {
    /// Create a new probe result.
    pub fn new(size: u64, modified: DateTime<Utc>) -> Self {
        Self { size, modified }
    }

    /// Build from filesystem metadata.
    ///
    /// Returns `None` for anything other than a regular file, or when the
    /// platform cannot report a modification time.
    pub fn from_metadata(metadata: &Metadata) -> Option<Self> {
        if !metadata.is_file() {
            return None;
        }
        let modified = metadata.modified().ok()?;
        Some(Self::new(metadata.len(), DateTime::<Utc>::from(modified)))
    }
}
