//! Runtime settings for an [`Installer`](super::Installer).

use std::path::PathBuf;
use std::time::Duration;

use super::strategy::Strategy;
use super::transfer::DEFAULT_SAMPLE_INTERVAL;

/// Installer settings.
///
/// # Example
///
/// ```
/// use modsync::{InstallerConfig, Strategy};
///
/// let config = InstallerConfig::new("/games/sc2")
///     .with_strategy(Strategy::Queue)
///     .with_version("5.0.11");
/// assert_eq!(config.strategy, Strategy::Queue);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct InstallerConfig {
    /// Local installation root.
    pub directory: PathBuf,
    /// Scheduling strategy for installs.
    pub strategy: Strategy,
    /// Selected version identifier.
    pub version: Option<String>,
    /// Label of the remote root; defaults to the manifest source's host.
    pub host: Option<String>,
    /// Launch target handed to the launcher.
    pub launch_target: Option<String>,
    /// Throughput sampling period.
    pub sample_interval: Duration,
}

impl InstallerConfig {
    /// Create a configuration for the given installation root.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            strategy: Strategy::default(),
            version: None,
            host: None,
            launch_target: None,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }

    /// Set the scheduling strategy.
    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Select a version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Override the remote root label.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the launch target.
    pub fn with_launch_target(mut self, target: impl Into<String>) -> Self {
        self.launch_target = Some(target.into());
        self
    }

    /// Override the throughput sampling period.
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }
}
