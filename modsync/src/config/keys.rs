//! Dotted `section.key` access to configuration values.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::error::{ConfigError, ConfigResult};
use super::file::ConfigFile;
use crate::installer::Strategy;

/// A configurable setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    InstallDirectory,
    InstallVersion,
    InstallStrategy,
    RemoteManifestUrl,
    RemoteStorageUrl,
    RemoteTimeoutSecs,
    LaunchTarget,
}

impl ConfigKey {
    /// Every key, grouped by section.
    pub fn all() -> &'static [ConfigKey] {
        &[
            Self::InstallDirectory,
            Self::InstallVersion,
            Self::InstallStrategy,
            Self::RemoteManifestUrl,
            Self::RemoteStorageUrl,
            Self::RemoteTimeoutSecs,
            Self::LaunchTarget,
        ]
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallDirectory => "install.directory",
            Self::InstallVersion => "install.version",
            Self::InstallStrategy => "install.strategy",
            Self::RemoteManifestUrl => "remote.manifest_url",
            Self::RemoteStorageUrl => "remote.storage_url",
            Self::RemoteTimeoutSecs => "remote.timeout_secs",
            Self::LaunchTarget => "launch.target",
        }
    }

    /// Section part of the name.
    pub fn section(&self) -> &'static str {
        self.name().split_once('.').map(|(s, _)| s).unwrap_or("")
    }

    /// Key part of the name.
    pub fn key_name(&self) -> &'static str {
        self.name().split_once('.').map(|(_, k)| k).unwrap_or("")
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            Self::InstallDirectory => config
                .install
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            Self::InstallVersion => config.install.version.clone().unwrap_or_default(),
            Self::InstallStrategy => config.install.strategy.to_string(),
            Self::RemoteManifestUrl => config.remote.manifest_url.clone().unwrap_or_default(),
            Self::RemoteStorageUrl => config.remote.storage_url.clone().unwrap_or_default(),
            Self::RemoteTimeoutSecs => config.remote.timeout_secs.to_string(),
            Self::LaunchTarget => config.launch.target.clone().unwrap_or_default(),
        }
    }

    /// Validate and store `value`. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        let optional = || (!value.is_empty()).then(|| value.to_string());
        let invalid = |reason: String| ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason,
        };

        match self {
            Self::InstallDirectory => config.install.directory = optional().map(PathBuf::from),
            Self::InstallVersion => config.install.version = optional(),
            Self::InstallStrategy => {
                config.install.strategy =
                    value.parse::<Strategy>().map_err(|e| invalid(e.to_string()))?;
            }
            Self::RemoteManifestUrl => config.remote.manifest_url = optional(),
            Self::RemoteStorageUrl => config.remote.storage_url = optional(),
            Self::RemoteTimeoutSecs => {
                let secs: u64 = value.parse().map_err(|e: std::num::ParseIntError| invalid(e.to_string()))?;
                if secs == 0 {
                    return Err(invalid("timeout must be at least 1 second".to_string()));
                }
                config.remote.timeout_secs = secs;
            }
            Self::LaunchTarget => config.launch.target = optional(),
        }
        Ok(())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
