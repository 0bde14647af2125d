//! Distribution package managers: apt, dnf, pacman, flatpak, snap

use super::{count_lines, BackendCheckResult};
use crate::exec::{CommandOutput, CommandSpec};

/// `dnf check-update` exits 100 when updates are pending
const DNF_UPDATES_EXIT: i32 = 100;

/// `checkupdates` exits 2 when there is nothing to update
const CHECKUPDATES_NONE_EXIT: i32 = 2;

pub(super) fn apt_check() -> CommandSpec {
    CommandSpec::new("apt", &["list", "--upgradable"]).with_env("LC_ALL", "C")
}

pub(super) fn dnf_check() -> CommandSpec {
    CommandSpec::new("dnf", &["check-update", "-q"])
}

/// pacman itself can only see updates after a database sync (`-Sy`), which
/// mutates the host; `checkupdates` syncs into a private copy instead.
pub(super) fn pacman_check() -> CommandSpec {
    CommandSpec::new("checkupdates", &[])
}

pub(super) fn flatpak_check() -> CommandSpec {
    CommandSpec::new(
        "flatpak",
        &["remote-ls", "--updates", "--columns=application"],
    )
}

pub(super) fn snap_check() -> CommandSpec {
    CommandSpec::new("snap", &["refresh", "--list"])
}

/// `apt list --upgradable`: one `name/suite version arch [upgradable from: x]`
/// line per package, after a `Listing...` banner
pub(super) fn parse_apt(output: &CommandOutput) -> BackendCheckResult {
    if !output.success() {
        return exit_failure("apt list", output);
    }
    let count = output
        .stdout
        .lines()
        .filter(|l| l.contains("[upgradable from"))
        .count();
    BackendCheckResult::from_count(count)
}

pub(super) fn parse_dnf(output: &CommandOutput) -> BackendCheckResult {
    match output.code {
        Some(0) => BackendCheckResult::NoUpdates,
        Some(DNF_UPDATES_EXIT) => {
            let count = output
                .stdout
                .lines()
                .take_while(|l| !l.starts_with("Obsoleting"))
                .filter(|l| !l.starts_with(char::is_whitespace))
                .filter(|l| l.split_whitespace().count() == 3)
                .count();
            if count == 0 {
                BackendCheckResult::UpdatesAvailable { count: None }
            } else {
                BackendCheckResult::from_count(count)
            }
        }
        _ => exit_failure("dnf check-update", output),
    }
}

pub(super) fn parse_checkupdates(output: &CommandOutput) -> BackendCheckResult {
    match output.code {
        Some(0) => BackendCheckResult::from_count(count_lines(&output.stdout)),
        Some(CHECKUPDATES_NONE_EXIT) => BackendCheckResult::NoUpdates,
        _ => exit_failure("checkupdates", output),
    }
}

pub(super) fn parse_flatpak(output: &CommandOutput) -> BackendCheckResult {
    if !output.success() {
        return exit_failure("flatpak remote-ls", output);
    }
    let count = output
        .stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && *l != "Application ID")
        .count();
    BackendCheckResult::from_count(count)
}

/// `snap refresh --list` prints a `Name Version Rev ...` table, or
/// "All snaps up to date." on stderr
pub(super) fn parse_snap(output: &CommandOutput) -> BackendCheckResult {
    if !output.success() {
        return exit_failure("snap refresh --list", output);
    }
    let count = output
        .stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter(|l| !l.starts_with("Name "))
        .count();
    BackendCheckResult::from_count(count)
}

pub(super) fn exit_failure(command: &str, output: &CommandOutput) -> BackendCheckResult {
    let code = output
        .code
        .map(|c| c.to_string())
        .unwrap_or_else(|| "signal".to_string());
    let stderr = output.stderr.lines().next().unwrap_or("").trim();
    if stderr.is_empty() {
        BackendCheckResult::cannot_determine(format!("{} exited with {}", command, code))
    } else {
        BackendCheckResult::cannot_determine(format!(
            "{} exited with {}: {}",
            command, code, stderr
        ))
    }
}
