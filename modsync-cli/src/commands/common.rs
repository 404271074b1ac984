//! Common types and helpers shared across CLI commands.

use std::path::PathBuf;
use std::sync::Arc;

use clap::ValueEnum;
use modsync::config::ConfigFile;
use modsync::installer::Collaborators;
use modsync::manifest::HttpManifestSource;
use modsync::remote::HttpStorage;
use modsync::{Installer, InstallerConfig, InstallerState, Strategy};

use crate::error::CliError;

/// Flags accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub directory: Option<PathBuf>,
    pub version: Option<String>,
    pub verbose: bool,
    pub json: bool,
}

/// Scheduling strategy selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum StrategyArg {
    /// One file at a time
    Queue,
    /// Every file at once
    Parallel,
}

impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Queue => Strategy::Queue,
            StrategyArg::Parallel => Strategy::Parallel,
        }
    }
}

/// Load config or return default.
pub fn load_config() -> ConfigFile {
    ConfigFile::load().unwrap_or_default()
}

/// Resolve installer settings: CLI flags take precedence over the config file.
pub fn resolve_installer_config(
    global: &GlobalArgs,
    config: &ConfigFile,
) -> Result<InstallerConfig, CliError> {
    let mut resolved = config
        .installer_config(global.directory.clone())
        .ok_or_else(|| {
            CliError::Config(
                "No installation directory specified. Use --directory or set directory in config.ini [install] section."
                    .to_string(),
            )
        })?;
    if let Some(version) = &global.version {
        resolved.version = Some(version.clone());
    }
    Ok(resolved)
}

fn require_url(value: &Option<String>, key: &str) -> Result<String, CliError> {
    value.clone().ok_or_else(|| {
        CliError::Config(format!(
            "No {} configured. Use 'modsync config set remote.{} <url>'.",
            key, key
        ))
    })
}

/// Build an installer backed by the configured HTTP endpoints.
pub fn build_installer(
    global: &GlobalArgs,
    observer: impl FnMut(&InstallerState) + Send + 'static,
) -> Result<Installer, CliError> {
    let config = load_config();
    let installer_config = resolve_installer_config(global, &config)?;

    let manifest_url = require_url(&config.remote.manifest_url, "manifest_url")?;
    let storage_url = require_url(&config.remote.storage_url, "storage_url")?;
    let timeout = config.remote.timeout();

    let manifest = HttpManifestSource::new(manifest_url, timeout)
        .map_err(|e| CliError::Http(e.to_string()))?;
    let storage =
        HttpStorage::new(storage_url, timeout).map_err(|e| CliError::Http(e.to_string()))?;

    let collaborators = Collaborators::with_local_fs(Arc::new(manifest), Arc::new(storage));
    Ok(Installer::new(installer_config, collaborators, observer))
}

/// Print `state` as pretty JSON.
pub fn print_json(state: &InstallerState) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(state)?);
    Ok(())
}
