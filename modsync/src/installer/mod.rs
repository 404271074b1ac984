//! Installer engine.
//!
//! This module ties reconciliation, transfer orchestration, and state
//! broadcasting together behind [`Installer`].
//!
//! # Lifecycle
//!
//! ```text
//! Installer::new ──► initialize ──► (set_directory | set_version | check)*
//!                                         │
//!                                         ▼
//!                                      install ◄── Canceller::cancel
//! ```
//!
//! Every step runs on the caller's task. Transfers run concurrently inside
//! `install`, but their results are applied to the state by a single event
//! loop, so the observer always sees a consistent snapshot.

mod broadcast;
mod callbacks;
mod cancel;
mod config;
mod engine;
mod error;
mod reconcile;
mod state;
mod strategy;
mod transfer;

pub use broadcast::{Broadcaster, Observer};
pub use callbacks::{FileCallback, FileErrorCallback, InstallCallbacks, StateCallback};
pub use cancel::Canceller;
pub use config::InstallerConfig;
pub use engine::{Collaborators, Installer};
pub use error::{InstallerError, InstallerResult, TransferError, TransferResult};
pub use reconcile::{is_up_to_date, reconcile_entry, scope_files, Reconciler, Reconciliation};
pub use state::{ActiveTransfer, FileStatus, InstallerState};
pub use strategy::{ParseStrategyError, Strategy};
pub use transfer::{TransferOrchestrator, DEFAULT_SAMPLE_INTERVAL};
