//! Loading and saving `config.ini`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;

use super::error::{ConfigError, ConfigResult};
use crate::installer::{InstallerConfig, Strategy};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

const APP_DIR: &str = "modsync";
const FILE_NAME: &str = "config.ini";

/// Directory holding the configuration file and logs.
pub fn config_directory() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// Location of the configuration file.
pub fn config_file_path() -> PathBuf {
    config_directory().join(FILE_NAME)
}

/// `[install]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallSection {
    pub directory: Option<PathBuf>,
    pub version: Option<String>,
    pub strategy: Strategy,
}

/// `[remote]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSection {
    pub manifest_url: Option<String>,
    pub storage_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RemoteSection {
    fn default() -> Self {
        Self {
            manifest_url: None,
            storage_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl RemoteSection {
    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// `[launch]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchSection {
    pub target: Option<String>,
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    pub install: InstallSection,
    pub remote: RemoteSection,
    pub launch: LaunchSection,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl ConfigFile {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`; a missing file yields defaults.
    ///
    /// Invalid values are rejected rather than silently replaced.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    fn from_ini(ini: &Ini) -> ConfigResult<Self> {
        let get = |section: &str, key: &str| {
            non_empty(ini.section(Some(section)).and_then(|s| s.get(key)))
        };

        let mut config = Self::default();

        config.install.directory = get("install", "directory").map(PathBuf::from);
        config.install.version = get("install", "version");
        if let Some(value) = get("install", "strategy") {
            config.install.strategy = value.parse().map_err(|e: crate::installer::ParseStrategyError| {
                ConfigError::InvalidValue {
                    key: "install.strategy".to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                }
            })?;
        }

        config.remote.manifest_url = get("remote", "manifest_url");
        config.remote.storage_url = get("remote", "storage_url");
        if let Some(value) = get("remote", "timeout_secs") {
            config.remote.timeout_secs =
                value.parse().map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                    key: "remote.timeout_secs".to_string(),
                    value: value.clone(),
                    reason: e.to_string(),
                })?;
        }

        config.launch.target = get("launch", "target");
        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        ini.with_section(Some("install"))
            .set(
                "directory",
                self.install
                    .directory
                    .as_ref()
                    .map(|d| d.to_string_lossy().into_owned())
                    .unwrap_or_default(),
            )
            .set("version", self.install.version.clone().unwrap_or_default())
            .set("strategy", self.install.strategy.as_str());
        ini.with_section(Some("remote"))
            .set("manifest_url", self.remote.manifest_url.clone().unwrap_or_default())
            .set("storage_url", self.remote.storage_url.clone().unwrap_or_default())
            .set("timeout_secs", self.remote.timeout_secs.to_string());
        ini.with_section(Some("launch"))
            .set("target", self.launch.target.clone().unwrap_or_default());
        ini
    }

    /// Save to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        self.to_ini().write_to_file(path).map_err(write_err)
    }

    /// Installer settings for `directory`, falling back to the configured one.
    pub fn installer_config(&self, directory: Option<PathBuf>) -> Option<InstallerConfig> {
        let directory = directory.or_else(|| self.install.directory.clone())?;
        let mut config = InstallerConfig::new(directory).with_strategy(self.install.strategy);
        config.version = self.install.version.clone();
        config.launch_target = self.launch.target.clone();
        Some(config)
    }
}
