//! File logging setup.
//!
//! Logs go to a daily rolling `modsync.log` in the given directory through a
//! non-blocking writer. Keep the returned guard alive until exit so buffered
//! lines are flushed.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::fmt::Subscriber;
use tracing_subscriber::EnvFilter;

/// Log file name prefix; the appender adds the date suffix.
pub const LOG_FILE_NAME: &str = "modsync.log";

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// The log directory could not be created.
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A global subscriber is already installed.
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(String),
}

/// Default filter directive.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber writing to `log_dir`.
///
/// `RUST_LOG` overrides the default level.
pub fn init(log_dir: &Path, verbose: bool) -> Result<WorkerGuard, LoggingError> {
    fs::create_dir_all(log_dir).map_err(|source| LoggingError::CreateDir {
        path: log_dir.to_path_buf(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    // Local offset is unavailable on some platforms once threads exist
    let timer = OffsetTime::local_rfc_3339()
        .unwrap_or_else(|_| OffsetTime::new(UtcOffset::UTC, Rfc3339));

    let subscriber = Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

    Ok(guard)
}
