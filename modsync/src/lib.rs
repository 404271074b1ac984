//! ModSync - keeps a local installation in sync with a remote file manifest.
//!
//! The library reconciles a local directory tree against a versioned remote
//! manifest and drives concurrent downloads to bring the tree up to date,
//! reporting aggregate and per-file progress to a single observer.
//!
//! # Architecture
//!
//! ```text
//! Installer (engine + state broadcaster)
//!     │
//!     ├── Reconciler ───────► ManifestSource (versions + file listing)
//!     │                 └───► FileProber (local size / mtime)
//!     │
//!     ├── TransferOrchestrator
//!     │       ├── RemoteStorage (byte streams)
//!     │       ├── FileWriter (acknowledged local writes)
//!     │       └── Strategy (Queue | Parallel)
//!     │
//!     └── Observer ◄── InstallerState after every mutation
//! ```

pub mod config;
pub mod installer;
pub mod launch;
pub mod local;
pub mod logging;
pub mod manifest;
pub mod remote;

use std::future::Future;
use std::pin::Pin;

/// Boxed future type for dyn-compatible async collaborator traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use installer::{
    Canceller, FileStatus, InstallCallbacks, Installer, InstallerConfig, InstallerError,
    InstallerState, Strategy,
};
