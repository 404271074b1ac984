//! ModSync CLI - keep a local mod installation in sync with its manifest.

mod commands;
mod error;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use console::style;

use commands::common::{GlobalArgs, StrategyArg};
use commands::config::ConfigCommands;
use error::CliError;

/// Keeps a local mod installation in sync with its remote manifest.
#[derive(Debug, Parser)]
#[command(name = "modsync", about, long_about = None)]
struct Cli {
    /// Installation directory (overrides install.directory)
    #[arg(long, global = true)]
    directory: Option<PathBuf>,

    /// Version identifier to install (overrides install.version)
    #[arg(long, global = true, value_name = "ID")]
    version: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print the final state as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show which files are up to date
    Status,

    /// List available versions
    Versions,

    /// Download every missing or outdated file
    Install {
        /// Scheduling strategy (overrides install.strategy)
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },

    /// Launch the installed application
    Launch,

    /// View or modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{} {}", style("error:").red().bold(), e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let global = GlobalArgs {
        directory: cli.directory,
        version: cli.version,
        verbose: cli.verbose,
        json: cli.json,
    };

    match cli.command {
        Commands::Config(command) => commands::config::run(command),
        Commands::Launch => commands::launch::run(),
        Commands::Status => commands::block_on(&global, commands::status::run(&global)),
        Commands::Versions => commands::block_on(&global, commands::versions::run(&global)),
        Commands::Install { strategy } => commands::block_on(
            &global,
            commands::install::run(&global, strategy.map(Into::into)),
        ),
    }
}
