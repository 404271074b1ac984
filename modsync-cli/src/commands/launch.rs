//! Launch command - open the installed application.

use modsync::launch::{AppLauncher, LaunchError, SystemLauncher};

use super::common::load_config;
use crate::error::CliError;

/// Run the launch command.
pub fn run() -> Result<(), CliError> {
    let config = load_config();
    let target = config.launch.target.ok_or(LaunchError::NoTarget)?;
    SystemLauncher::new().launch(&target)?;
    println!("Launched {}", target);
    Ok(())
}
