//! Homebrew

use super::system::exit_failure;
use super::{count_lines, BackendCheckResult};
use crate::exec::{CommandOutput, CommandSpec};

/// `brew outdated` would otherwise run `brew update` first, which rewrites
/// the local tap checkouts.
pub(super) fn check() -> CommandSpec {
    CommandSpec::new("brew", &["outdated", "--quiet"]).with_env("HOMEBREW_NO_AUTO_UPDATE", "1")
}

pub(super) fn parse(output: &CommandOutput) -> BackendCheckResult {
    if !output.success() {
        return exit_failure("brew outdated", output);
    }
    BackendCheckResult::from_count(count_lines(&output.stdout))
}
