//! CLI subcommands.

pub mod common;
pub mod config;
pub mod install;
pub mod launch;
pub mod status;
pub mod versions;

use std::future::Future;

use modsync::config::config_directory;

use self::common::GlobalArgs;
use crate::error::CliError;

/// Set up file logging and a runtime, then drive `command` to completion.
pub fn block_on<F>(global: &GlobalArgs, command: F) -> Result<(), CliError>
where
    F: Future<Output = Result<(), CliError>>,
{
    let _guard = modsync::logging::init(&config_directory().join("logs"), global.verbose)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    runtime.block_on(command)
}
