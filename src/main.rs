//! dotpulse - cached shell status
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use dotpulse::cli::{Cli, Commands};
use dotpulse::config::{Config, ConfigManager};
use dotpulse::error::DotpulseResult;
use dotpulse::{logging, ui};
use std::process::ExitCode;
use tracing::debug;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> DotpulseResult<()> {
    let cli = Cli::parse();
    cli.validate().unwrap_or_else(|e| e.exit());
    let command = cli.effective_command();

    // Completions need neither logging nor config
    if let Commands::Completions(args) = command {
        return dotpulse::cli::commands::completions(args);
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::new(),
    };
    let config = apply_overrides(config_manager.load().await?, &cli);

    match &command {
        Commands::Refresh(args) if args.background => {
            logging::init_background(&config.cache_dir(), cli.verbose)
        }
        _ => {
            logging::init_foreground(cli.verbose);
            ui::init_theme();
        }
    }
    debug!("Using cache directory {}", config.cache_dir().display());

    match command {
        Commands::Status(args) => {
            dotpulse::cli::commands::status(args, &config, cli.config.as_deref()).await
        }
        Commands::Refresh(args) => dotpulse::cli::commands::refresh(args, &config).await,
        Commands::Backends(args) => dotpulse::cli::commands::backends(args, &config).await,
        Commands::Upgrade(args) => dotpulse::cli::commands::upgrade(args, &config).await,
        Commands::Cache(args) => dotpulse::cli::commands::cache(args, &config).await,
        Commands::Config(args) => {
            dotpulse::cli::commands::config(args, &config_manager, &config).await
        }
        Commands::Completions(_) => unreachable!("Completions handled above"),
    }
}

/// Command-line and environment overrides win over the file
fn apply_overrides(mut config: Config, cli: &Cli) -> Config {
    if let Some(ref dir) = cli.cache_dir {
        config.cache.dir = Some(dir.clone());
    }
    if let Some(ref repo) = cli.repo {
        config.git.repo = Some(repo.clone());
    }
    config
}
