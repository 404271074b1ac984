//! Configuration errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading, writing, or editing the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read or parsed.
    #[error("failed to read config {}: {reason}", path.display())]
    Read { path: PathBuf, reason: String },

    /// The configuration file could not be written.
    #[error("failed to write config {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A key outside the known set.
    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    /// A value that does not parse for its key.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
