//! Package manager backends
//!
//! Every backend answers the same tri-state question with a read-only query:
//! - `NO_UPDATES`: the query succeeded and found nothing
//! - `UPDATES_AVAILABLE`: the query succeeded and found something
//! - `CANNOT_DETERMINE`: the query failed, timed out, or does not exist
//!
//! A backend whose tool has no read-only "outdated" primitive answers
//! `CANNOT_DETERMINE` forever; it never guesses. The mutating upgrade command
//! is only reachable through [`Backend::apply`].

mod homebrew;
mod language;
mod system;

use crate::error::DotpulseError;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

/// Persisted tri-state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpdateState {
    NoUpdates,
    UpdatesAvailable,
    CannotDetermine,
}

/// Outcome of one backend check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCheckResult {
    NoUpdates,
    /// `count` is absent when the tool signals updates without listing them
    UpdatesAvailable { count: Option<u32> },
    CannotDetermine { reason: String },
}

impl BackendCheckResult {
    /// Result for a successfully counted list of pending updates
    pub fn from_count(count: usize) -> Self {
        if count == 0 {
            Self::NoUpdates
        } else {
            Self::UpdatesAvailable {
                count: Some(u32::try_from(count).unwrap_or(u32::MAX)),
            }
        }
    }

    pub fn cannot_determine(reason: impl Into<String>) -> Self {
        Self::CannotDetermine {
            reason: reason.into(),
        }
    }

    pub fn state(&self) -> UpdateState {
        match self {
            Self::NoUpdates => UpdateState::NoUpdates,
            Self::UpdatesAvailable { .. } => UpdateState::UpdatesAvailable,
            Self::CannotDetermine { .. } => UpdateState::CannotDetermine,
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self {
            Self::UpdatesAvailable { count } => *count,
            _ => None,
        }
    }
}

/// Outcome of an upgrade attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyResult {
    pub backend: Backend,
    /// The upgrade command, as shown to the user
    pub command: String,
    /// Whether the command was actually run
    pub executed: bool,
    pub success: bool,
    /// Tail of the command output on failure
    pub detail: Option<String>,
}

/// Supported package managers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Backend {
    Apt,
    Dnf,
    Pacman,
    Homebrew,
    Flatpak,
    Snap,
    Npm,
    Cargo,
    Rustup,
    Pipx,
}

impl Backend {
    /// Every known backend, in polling order
    pub const ALL: [Backend; 10] = [
        Backend::Apt,
        Backend::Dnf,
        Backend::Pacman,
        Backend::Homebrew,
        Backend::Flatpak,
        Backend::Snap,
        Backend::Npm,
        Backend::Cargo,
        Backend::Rustup,
        Backend::Pipx,
    ];

    /// Name used in config, output and the cache
    pub fn name(&self) -> &'static str {
        match self {
            Self::Apt => "apt",
            Self::Dnf => "dnf",
            Self::Pacman => "pacman",
            Self::Homebrew => "brew",
            Self::Flatpak => "flatpak",
            Self::Snap => "snap",
            Self::Npm => "npm",
            Self::Cargo => "cargo",
            Self::Rustup => "rustup",
            Self::Pipx => "pipx",
        }
    }

    /// Binary whose presence makes the backend available
    pub fn binary(&self) -> &'static str {
        match self {
            Self::Homebrew => "brew",
            _ => self.name(),
        }
    }

    /// Extra helper the read-only query depends on
    fn helper(&self) -> Option<&'static str> {
        match self {
            Self::Pacman => Some("checkupdates"),
            Self::Cargo => Some("cargo-install-update"),
            _ => None,
        }
    }

    /// Whether the backend's tool is installed on this host
    pub fn is_available(&self, runner: &dyn CommandRunner) -> bool {
        runner.program_exists(self.binary())
    }

    /// The read-only query, or `None` when the tool offers none
    pub fn check_command(&self) -> Option<CommandSpec> {
        match self {
            Self::Apt => Some(system::apt_check()),
            Self::Dnf => Some(system::dnf_check()),
            Self::Pacman => Some(system::pacman_check()),
            Self::Flatpak => Some(system::flatpak_check()),
            Self::Snap => Some(system::snap_check()),
            Self::Homebrew => Some(homebrew::check()),
            Self::Npm => Some(language::npm_check()),
            Self::Cargo => Some(language::cargo_check()),
            Self::Rustup => Some(language::rustup_check()),
            Self::Pipx => None,
        }
    }

    /// The mutating upgrade command
    pub fn apply_command(&self) -> CommandSpec {
        match self {
            Self::Apt => CommandSpec::new("sudo", &["apt-get", "upgrade", "-y"]),
            Self::Dnf => CommandSpec::new("sudo", &["dnf", "upgrade", "-y"]),
            Self::Pacman => CommandSpec::new("sudo", &["pacman", "-Syu", "--noconfirm"]),
            Self::Flatpak => CommandSpec::new("flatpak", &["update", "-y", "--noninteractive"]),
            Self::Snap => CommandSpec::new("sudo", &["snap", "refresh"]),
            Self::Homebrew => CommandSpec::new("brew", &["upgrade"]),
            Self::Npm => CommandSpec::new("npm", &["update", "-g"]),
            Self::Cargo => CommandSpec::new("cargo", &["install-update", "-a"]),
            Self::Rustup => CommandSpec::new("rustup", &["update"]),
            Self::Pipx => CommandSpec::new("pipx", &["upgrade-all"]),
        }
    }

    /// Check for pending updates without changing anything.
    ///
    /// Never fails: missing helpers, spawn errors, bad exit codes and
    /// timeouts all become `CANNOT_DETERMINE`.
    pub async fn check(&self, runner: &dyn CommandRunner, timeout: Duration) -> BackendCheckResult {
        let Some(spec) = self.check_command() else {
            return BackendCheckResult::cannot_determine(format!(
                "{} has no read-only update query",
                self.name()
            ));
        };

        if let Some(helper) = self.helper() {
            if !runner.program_exists(helper) {
                return BackendCheckResult::cannot_determine(format!(
                    "{} is not installed",
                    helper
                ));
            }
        }

        match runner.run(&spec, timeout).await {
            Ok(output) => self.interpret(&output),
            Err(e) => {
                debug!("{} check failed: {}", self.name(), e);
                BackendCheckResult::cannot_determine(e.to_string())
            }
        }
    }

    fn interpret(&self, output: &CommandOutput) -> BackendCheckResult {
        match self {
            Self::Apt => system::parse_apt(output),
            Self::Dnf => system::parse_dnf(output),
            Self::Pacman => system::parse_checkupdates(output),
            Self::Flatpak => system::parse_flatpak(output),
            Self::Snap => system::parse_snap(output),
            Self::Homebrew => homebrew::parse(output),
            Self::Npm => language::parse_npm(output),
            Self::Cargo => language::parse_cargo_install_update(output),
            Self::Rustup => language::parse_rustup(output),
            Self::Pipx => BackendCheckResult::cannot_determine("pipx has no read-only update query"),
        }
    }

    /// Run (or with `dry_run`, only describe) the upgrade command
    pub async fn apply(
        &self,
        runner: &dyn CommandRunner,
        dry_run: bool,
        timeout: Duration,
    ) -> ApplyResult {
        let spec = self.apply_command();
        let mut result = ApplyResult {
            backend: *self,
            command: spec.to_string(),
            executed: false,
            success: false,
            detail: None,
        };

        if dry_run {
            return result;
        }

        result.executed = true;
        match runner.run(&spec, timeout).await {
            Ok(output) if output.success() => result.success = true,
            Ok(output) => result.detail = Some(output.tail()),
            Err(e) => result.detail = Some(e.to_string()),
        }
        result
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Backend {
    type Err = DotpulseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        if wanted == "homebrew" {
            return Ok(Self::Homebrew);
        }
        Self::ALL
            .into_iter()
            .find(|b| b.name() == wanted)
            .ok_or_else(|| DotpulseError::UnknownBackend(s.to_string()))
    }
}

/// Count non-blank lines
pub(crate) fn count_lines(text: &str) -> usize {
    text.lines().filter(|l| !l.trim().is_empty()).count()
}
