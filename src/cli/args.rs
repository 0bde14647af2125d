//! CLI argument definitions using clap derive

use crate::domains::Domain;
use clap::error::ErrorKind;
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use std::path::PathBuf;

/// dotpulse - cached shell status for packages, git and provisioning
///
/// With no subcommand, prints the status report. Each fact is served from
/// the cache and refreshed in the background once it goes stale, so the
/// command stays fast enough for shell startup.
#[derive(Parser, Debug)]
#[command(name = "dotpulse")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute (default: status)
    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub status: StatusArgs,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DOTPULSE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Cache directory (overrides cache.dir)
    #[arg(long, global = true, env = "DOTPULSE_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Repository for the git domain (overrides git.repo)
    #[arg(long, global = true, env = "DOTPULSE_REPO")]
    pub repo: Option<PathBuf>,
}

impl Cli {
    /// The subcommand, with a bare invocation meaning `status`
    pub fn effective_command(&self) -> Commands {
        match self.command {
            Some(Commands::Status(ref args)) => Commands::Status(StatusArgs {
                quiet: args.quiet || self.status.quiet,
                json: args.json || self.status.json,
                refresh: args.refresh || self.status.refresh,
            }),
            Some(ref command) => command.clone(),
            None => Commands::Status(self.status.clone()),
        }
    }

    /// Reject top-level status flags combined with another subcommand.
    ///
    /// Global options (`--config`, `--cache-dir`, `--repo`, `-v`) are accepted
    /// on either side of any subcommand.
    pub fn validate(&self) -> Result<(), clap::Error> {
        let status_flags = self.status.quiet || self.status.json || self.status.refresh;
        match self.command {
            Some(Commands::Status(_)) | None => Ok(()),
            Some(_) if status_flags => Err(Cli::command().error(
                ErrorKind::ArgumentConflict,
                "--quiet, --json and --refresh only apply to the status command",
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show cached status (the default)
    Status(StatusArgs),

    /// Recompute domains now and update the cache
    Refresh(RefreshArgs),

    /// List package manager backends and whether they are installed
    Backends(BackendsArgs),

    /// Apply pending package updates
    Upgrade(UpgradeArgs),

    /// Inspect or clear the status cache
    Cache(CacheArgs),

    /// Show or edit configuration
    Config(ConfigArgs),

    /// Print a shell completion script
    Completions(CompletionsArgs),
}

/// Arguments for the status command
#[derive(Args, Debug, Clone, Default)]
pub struct StatusArgs {
    /// Print only actionable lines, nothing when all is well
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON
    #[arg(long)]
    pub json: bool,

    /// Refresh stale domains before reporting instead of in the background
    #[arg(long)]
    pub refresh: bool,
}

/// Arguments for the refresh command
#[derive(Args, Debug, Clone)]
pub struct RefreshArgs {
    /// Domains to refresh (default: all)
    #[arg(value_parser = parse_domain)]
    pub domains: Vec<Domain>,

    /// Run as a detached background refresher (no terminal output)
    #[arg(long, hide = true)]
    pub background: bool,
}

/// Arguments for the backends command
#[derive(Args, Debug, Clone)]
pub struct BackendsArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the upgrade command
#[derive(Args, Debug, Clone)]
pub struct UpgradeArgs {
    /// Show the commands without running them
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Only upgrade these backends (repeatable)
    #[arg(short, long = "backend")]
    pub backends: Vec<String>,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the cache command
#[derive(Args, Debug, Clone)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
    /// Print the cache directory
    Path,

    /// Print raw cache documents
    Show {
        /// Only this domain
        #[arg(value_parser = parse_domain)]
        domain: Option<Domain>,
    },

    /// Delete cache documents
    Clear {
        /// Only this domain
        #[arg(short, long, value_parser = parse_domain)]
        domain: Option<Domain>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Arguments for the config command
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Set a configuration value
    Set {
        /// Configuration key (e.g., packages.ttl_secs)
        key: String,
        /// Value to set
        value: String,
    },
}

/// Arguments for the completions command
#[derive(Args, Debug, Clone)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: Shell,
}

/// Output format for listings
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

fn parse_domain(s: &str) -> Result<Domain, String> {
    s.parse().map_err(|e: crate::error::DotpulseError| e.to_string())
}
