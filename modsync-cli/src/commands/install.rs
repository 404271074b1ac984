//! Install command - download every missing or outdated file.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use console::style;
use indicatif::{HumanBytes, ProgressBar, ProgressStyle};
use modsync::{InstallCallbacks, InstallerState, Strategy};
use tracing::info;

use super::common::{build_installer, print_json, GlobalArgs};
use crate::error::CliError;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} {percent:>3}%  {msg}";

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    let style = ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Mirror the installer state onto the progress bar.
fn render(bar: &ProgressBar, state: &InstallerState) {
    if state.initializing {
        bar.set_message("checking local files");
        return;
    }
    bar.set_length(state.size);
    bar.set_position(state.loaded);
    if state.downloading {
        bar.set_message(format!(
            "{}/s, {} active",
            HumanBytes(state.speed),
            state.active_transfers()
        ));
    }
}

/// Run the install command.
pub async fn run(global: &GlobalArgs, strategy: Option<Strategy>) -> Result<(), CliError> {
    let bar = progress_bar();
    let observer_bar = bar.clone();
    let mut installer = build_installer(global, move |state| render(&observer_bar, state))?;
    if let Some(strategy) = strategy {
        installer.set_strategy(strategy);
    }

    let cancelled = Arc::new(AtomicBool::new(false));
    let cancelled_flag = Arc::clone(&cancelled);
    let canceller = installer.canceller();
    ctrlc::set_handler(move || {
        cancelled_flag.store(true, Ordering::SeqCst);
        canceller.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    installer.initialize().await?;
    if cancelled.load(Ordering::SeqCst) {
        bar.finish_and_clear();
        return Err(CliError::Cancelled);
    }

    let error_bar = bar.clone();
    let callbacks = InstallCallbacks::new()
        .on_file_error(move |file, err| {
            error_bar.println(format!("{} {}: {}", style("✗").red(), file.name, err));
        });

    info!(strategy = %installer.config().strategy, "Running install from CLI");
    installer.install(callbacks).await?;
    bar.finish_and_clear();

    let state = installer.state();
    if global.json {
        print_json(state)?;
    }

    if cancelled.load(Ordering::SeqCst) && !state.ready {
        return Err(CliError::Cancelled);
    }
    if state.error {
        let failed = state.files.iter().filter(|f| f.error).count();
        return Err(CliError::InstallFailed(failed));
    }

    if !global.json {
        println!(
            "{} {} file(s), {}",
            style("Up to date:").green().bold(),
            state.files.len(),
            HumanBytes(state.size)
        );
    }
    Ok(())
}
