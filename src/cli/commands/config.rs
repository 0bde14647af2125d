//! Config command - show or edit configuration

use crate::backends::Backend;
use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{DotpulseError, DotpulseResult};
use crate::ui::{self, UiContext};
use std::path::PathBuf;

/// Keys accepted by `config set`
const KEYS: &[&str] = &[
    "general.enabled",
    "general.background_refresh",
    "cache.dir",
    "packages.ttl_secs",
    "packages.check_timeout_secs",
    "packages.upgrade_timeout_secs",
    "packages.backends",
    "git.ttl_secs",
    "git.timeout_secs",
    "git.repo",
    "init.ttl_secs",
    "init.max_age_days",
    "init.managed_tree",
    "init.stamp_file",
];

/// Execute the config command
///
/// `show` prints the effective configuration (file plus command-line
/// overrides); `init` and `set` only ever touch the file.
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> DotpulseResult<()> {
    let ctx = UiContext::detect();

    match args.action {
        None | Some(ConfigAction::Show) => print!("{}", toml::to_string_pretty(config)?),
        Some(ConfigAction::Path) => println!("{}", manager.path().display()),
        Some(ConfigAction::Init { force }) => init_config(&ctx, manager, force).await?,
        Some(ConfigAction::Set { key, value }) => {
            let mut stored = manager.load().await?;
            apply_setting(&mut stored, &key, &value)?;
            manager.save(&stored).await?;
            ui::step_ok(&ctx, &format!("Set {} = {}", key, value));
        }
    }

    Ok(())
}

async fn init_config(ctx: &UiContext, manager: &ConfigManager, force: bool) -> DotpulseResult<()> {
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn(
            ctx,
            &format!("Config already exists at {} (use --force to overwrite)", path.display()),
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok(ctx, &format!("Configuration written to {}", path.display()));
    Ok(())
}

/// Assign one dot-separated key
fn apply_setting(config: &mut Config, key: &str, value: &str) -> DotpulseResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "enabled"] => config.general.enabled = parse_bool(value)?,
        ["general", "background_refresh"] => config.general.background_refresh = parse_bool(value)?,

        ["cache", "dir"] => config.cache.dir = parse_path(value),

        ["packages", "ttl_secs"] => config.packages.ttl_secs = parse_u64(value)?,
        ["packages", "check_timeout_secs"] => config.packages.check_timeout_secs = parse_u64(value)?,
        ["packages", "upgrade_timeout_secs"] => {
            config.packages.upgrade_timeout_secs = parse_u64(value)?
        }
        ["packages", "backends"] => config.packages.backends = parse_backends(value)?,

        ["git", "ttl_secs"] => config.git.ttl_secs = parse_u64(value)?,
        ["git", "timeout_secs"] => config.git.timeout_secs = parse_u64(value)?,
        ["git", "repo"] => config.git.repo = parse_path(value),

        ["init", "ttl_secs"] => config.init.ttl_secs = parse_u64(value)?,
        ["init", "max_age_days"] => {
            config.init.max_age_days = value
                .parse()
                .map_err(|_| DotpulseError::User(format!("Invalid number: {}", value)))?
        }
        ["init", "managed_tree"] => config.init.managed_tree = parse_path(value),
        ["init", "stamp_file"] => config.init.stamp_file = parse_path(value),

        _ => {
            return Err(DotpulseError::User(format!(
                "Unknown config key: {} (valid keys: {})",
                key,
                KEYS.join(", ")
            )))
        }
    }

    Ok(())
}

fn parse_bool(value: &str) -> DotpulseResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(DotpulseError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u64(value: &str) -> DotpulseResult<u64> {
    value
        .parse()
        .map_err(|_| DotpulseError::User(format!("Invalid number: {}", value)))
}

/// Empty string resets a path to its default
fn parse_path(value: &str) -> Option<PathBuf> {
    let value = value.trim();
    (!value.is_empty()).then(|| PathBuf::from(value))
}

/// Comma-separated backend names; `all` resets to every backend
fn parse_backends(value: &str) -> DotpulseResult<Option<Vec<String>>> {
    if value.trim().eq_ignore_ascii_case("all") {
        return Ok(None);
    }

    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| name.parse::<Backend>().map(|b| b.name().to_string()))
        .collect::<DotpulseResult<Vec<_>>>()
        .map(Some)
}
