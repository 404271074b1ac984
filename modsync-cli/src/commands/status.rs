//! Status command - reconcile and report per-file readiness.

use console::style;
use indicatif::HumanBytes;

use super::common::{build_installer, print_json, GlobalArgs};
use crate::error::CliError;

/// Run the status command.
pub async fn run(global: &GlobalArgs) -> Result<(), CliError> {
    let mut installer = build_installer(global, |_| {})?;
    installer.initialize().await?;
    let state = installer.state();

    if global.json {
        return print_json(state);
    }

    println!("Directory: {}", state.directory.display());
    println!("Remote:    {}", state.host);
    match state.selected_version() {
        Some(version) => println!("Version:   {}", version.display_name()),
        None => println!("Version:   (shared files only)"),
    }
    println!();

    for file in &state.files {
        let marker = if file.ready {
            style("✓").green()
        } else {
            style("✗").red()
        };
        println!("  {} {} ({})", marker, file.name, HumanBytes(file.size));
    }

    println!();
    let pending = state.pending_files().count();
    if state.ready {
        println!("{}", style("Up to date").green().bold());
    } else {
        println!(
            "{} of {} file(s) need updating ({} of {} present)",
            pending,
            state.files.len(),
            HumanBytes(state.loaded),
            HumanBytes(state.size)
        );
    }
    Ok(())
}
