//! Versions command - list installable versions.

use console::style;

use super::common::{build_installer, GlobalArgs};
use crate::error::CliError;

/// Run the versions command.
pub async fn run(global: &GlobalArgs) -> Result<(), CliError> {
    let mut installer = build_installer(global, |_| {})?;
    installer.initialize().await?;
    let state = installer.state();

    if global.json {
        println!("{}", serde_json::to_string_pretty(&state.versions)?);
        return Ok(());
    }

    if state.versions.is_empty() {
        println!("No versions available.");
        return Ok(());
    }

    let selected = state.version.as_deref();
    for version in &state.versions {
        let marker = if Some(version.id.as_str()) == selected {
            style("*").green().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {:<16} {:<20} {}",
            marker,
            version.id,
            version.directory,
            version.name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}
