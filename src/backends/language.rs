//! Language toolchain managers: npm globals, cargo binaries, rustup

use super::system::exit_failure;
use super::BackendCheckResult;
use crate::exec::{CommandOutput, CommandSpec};

/// `npm outdated` exits 1 when something is outdated
const NPM_OUTDATED_EXIT: i32 = 1;

/// `rustup check` exits 100 when an update is available (rustup 1.28+)
const RUSTUP_UPDATES_EXIT: i32 = 100;

pub(super) fn npm_check() -> CommandSpec {
    CommandSpec::new("npm", &["outdated", "-g", "--json"])
}

/// Needs the `cargo-update` crate, which provides `cargo install-update`
pub(super) fn cargo_check() -> CommandSpec {
    CommandSpec::new("cargo", &["install-update", "--list"])
}

pub(super) fn rustup_check() -> CommandSpec {
    CommandSpec::new("rustup", &["check"])
}

pub(super) fn parse_npm(output: &CommandOutput) -> BackendCheckResult {
    if !matches!(output.code, Some(0) | Some(NPM_OUTDATED_EXIT)) {
        return exit_failure("npm outdated", output);
    }

    let stdout = output.stdout.trim();
    if stdout.is_empty() {
        return BackendCheckResult::NoUpdates;
    }

    match serde_json::from_str::<serde_json::Value>(stdout) {
        Ok(serde_json::Value::Object(packages)) => BackendCheckResult::from_count(packages.len()),
        Ok(_) => BackendCheckResult::cannot_determine("npm outdated returned unexpected JSON"),
        Err(e) => {
            BackendCheckResult::cannot_determine(format!("npm outdated returned invalid JSON: {}", e))
        }
    }
}

/// Table with a trailing "Needs update" column of `Yes`/`No`
pub(super) fn parse_cargo_install_update(output: &CommandOutput) -> BackendCheckResult {
    if !output.success() {
        return exit_failure("cargo install-update", output);
    }
    let count = output
        .stdout
        .lines()
        .filter(|l| l.split_whitespace().last() == Some("Yes"))
        .count();
    BackendCheckResult::from_count(count)
}

/// One `<toolchain> - update available : a -> b` line per stale toolchain.
/// Older releases capitalize "Update" and exit 0 either way.
pub(super) fn parse_rustup(output: &CommandOutput) -> BackendCheckResult {
    let updates_exit = output.code == Some(RUSTUP_UPDATES_EXIT);
    if !output.success() && !updates_exit {
        return exit_failure("rustup check", output);
    }
    let count = output
        .stdout
        .lines()
        .filter(|l| l.to_ascii_lowercase().contains("update available"))
        .count();
    match count {
        0 if updates_exit => BackendCheckResult::UpdatesAvailable { count: None },
        n => BackendCheckResult::from_count(n),
    }
}
