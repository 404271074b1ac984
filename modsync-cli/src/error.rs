//! CLI error type.

use std::io;

use thiserror::Error;

use modsync::config::ConfigError;
use modsync::launch::LaunchError;
use modsync::logging::LoggingError;
use modsync::InstallerError;

/// Errors reported by CLI commands. Every variant exits with status 1.
#[derive(Debug, Error)]
pub enum CliError {
    /// Missing or inconsistent settings.
    #[error("{0}")]
    Config(String),

    #[error(transparent)]
    ConfigFile(#[from] ConfigError),

    #[error(transparent)]
    Installer(#[from] InstallerError),

    #[error(transparent)]
    Launch(#[from] LaunchError),

    #[error(transparent)]
    Logging(#[from] LoggingError),

    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),

    #[error("failed to create HTTP client: {0}")]
    Http(String),

    #[error("failed to encode state: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0} file(s) failed to install")]
    InstallFailed(usize),

    #[error("install cancelled")]
    Cancelled,
}
