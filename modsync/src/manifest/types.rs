//! Manifest descriptor types.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Root path component under which version-specific files live.
pub const VERSIONS_NAMESPACE: &str = "Versions";

/// An installable version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionDescriptor {
    /// Stable identifier used to select the version.
    pub id: String,
    /// Directory under [`VERSIONS_NAMESPACE`] holding this version's files.
    pub directory: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl VersionDescriptor {
    /// Create a version descriptor without a display name.
    pub fn new(id: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            directory: directory.into(),
            name: None,
        }
    }

    /// Display name, falling back to the identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// A single file listed by the remote manifest.
///
/// `path` is relative to the installation root and always uses `/` as the
/// separator, regardless of platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFileDescriptor {
    /// Backend-specific identifier.
    pub id: String,
    /// Relative path below the installation root.
    pub path: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time on the remote side.
    pub modified: DateTime<Utc>,
}

impl RemoteFileDescriptor {
    /// Create a new descriptor.
    pub fn new(
        id: impl Into<String>,
        path: impl Into<String>,
        size: u64,
        modified: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            size,
            modified,
        }
    }

    fn components(&self) -> impl Iterator<Item = &str> {
        self.path.split('/').filter(|c| !c.is_empty())
    }

    /// Version directory this file belongs to, if it lives in the versioned
    /// namespace.
    ///
    /// `Versions/Base1/a.bin` yields `Some("Base1")`; `Maps/a.map` and the bare
    /// `Versions` entry yield `None`.
    pub fn version_directory(&self) -> Option<&str> {
        let mut components = self.components();
        match (components.next(), components.next()) {
            (Some(VERSIONS_NAMESPACE), Some(directory)) => Some(directory),
            _ => None,
        }
    }

    /// Whether the file is shared by all versions.
    pub fn is_shared(&self) -> bool {
        self.components().next() != Some(VERSIONS_NAMESPACE)
    }

    /// Whether the file is part of the installation for `version`.
    ///
    /// Shared files are always in scope; versioned files only when their
    /// directory matches the selected version's directory.
    pub fn is_in_scope(&self, version: Option<&VersionDescriptor>) -> bool {
        if self.is_shared() {
            return true;
        }
        match (version, self.version_directory()) {
            (Some(v), Some(directory)) => v.directory == directory,
            _ => false,
        }
    }

    /// Whether the path stays inside the installation root.
    pub fn has_safe_path(&self) -> bool {
        !self.path.starts_with('/')
            && !self.path.contains('\\')
            && self.components().next().is_some()
            && self
                .components()
                .all(|c| c != ".." && c != "." && !c.contains(':'))
    }

    /// Resolve the local destination of this file below `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        self.components().fold(root.to_path_buf(), |acc, c| acc.join(c))
    }
}
