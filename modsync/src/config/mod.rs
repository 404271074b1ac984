//! Persistent configuration stored as an INI file.
//!
//! ```ini
//! [install]
//! directory = /games/StarCraft II
//! version = 5.0.11
//! strategy = parallel
//!
//! [remote]
//! manifest_url = https://mods.example.com/manifest
//! storage_url = https://mods.example.com/files
//! timeout_secs = 300
//!
//! [launch]
//! target = battlenet://SC2
//! ```

mod error;
mod file;
mod keys;

pub use error::{ConfigError, ConfigResult};
pub use file::{
    config_directory, config_file_path, ConfigFile, InstallSection, LaunchSection, RemoteSection,
    DEFAULT_TIMEOUT_SECS,
};
pub use keys::ConfigKey;
