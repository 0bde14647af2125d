//! Repository state via read-only git queries

use crate::error::{DotpulseError, DotpulseResult};
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Payload of the `git` domain.
///
/// When `in_repo` is false every other field is meaningless and must be read
/// as "unknown", never as "clean".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitPayload {
    pub in_repo: bool,

    /// Current branch; absent on a detached or unborn HEAD
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch: Option<String>,

    /// Tracking branch, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,

    /// Changed, staged or untracked paths
    #[serde(default)]
    pub uncommitted: u32,

    /// Commits not yet pushed to upstream
    #[serde(default)]
    pub ahead: u32,

    /// Upstream commits not yet pulled
    #[serde(default)]
    pub behind: u32,
}

impl GitPayload {
    /// Payload for a path that is not a work tree
    pub fn not_a_repo() -> Self {
        Self::default()
    }

    /// Whether there is uncommitted or unpushed work
    pub fn has_local_work(&self) -> bool {
        self.in_repo && (self.uncommitted > 0 || self.ahead > 0)
    }
}

/// Inspects one repository through a [`CommandRunner`]
pub struct GitInspector<'a> {
    runner: &'a dyn CommandRunner,
    repo: &'a Path,
    timeout: Duration,
}

impl<'a> GitInspector<'a> {
    pub fn new(runner: &'a dyn CommandRunner, repo: &'a Path, timeout: Duration) -> Self {
        Self {
            runner,
            repo,
            timeout,
        }
    }

    /// Collect branch, dirty count and divergence from upstream.
    ///
    /// Fails only when git itself cannot be run; a missing directory or a
    /// non-repository yields `in_repo: false`.
    pub async fn inspect(&self) -> DotpulseResult<GitPayload> {
        if !self.runner.program_exists("git") {
            return Err(DotpulseError::refresh_failed("git", "git is not installed"));
        }

        if !self.repo.is_dir() {
            debug!("{} does not exist, not a repository", self.repo.display());
            return Ok(GitPayload::not_a_repo());
        }

        let inside = self.git(&["rev-parse", "--is-inside-work-tree"]).await?;
        if !inside.success() || inside.stdout.trim() != "true" {
            return Ok(GitPayload::not_a_repo());
        }

        let status = self.git(&["status", "--porcelain"]).await?;
        if !status.success() {
            return Err(DotpulseError::command_exec("git status", status.stderr.trim()));
        }

        let mut payload = GitPayload {
            in_repo: true,
            branch: self.branch().await?,
            uncommitted: count_porcelain_entries(&status.stdout),
            ..GitPayload::default()
        };

        let upstream = self
            .git(&["rev-parse", "--abbrev-ref", "--symbolic-full-name", "@{upstream}"])
            .await?;
        if upstream.success() {
            payload.upstream = Some(upstream.stdout.trim().to_string());

            let counts = self
                .git(&["rev-list", "--left-right", "--count", "@{upstream}...HEAD"])
                .await?;
            if let Some((behind, ahead)) = parse_left_right(&counts.stdout) {
                payload.behind = behind;
                payload.ahead = ahead;
            }
        }

        Ok(payload)
    }

    async fn branch(&self) -> DotpulseResult<Option<String>> {
        let output = self.git(&["symbolic-ref", "--quiet", "--short", "HEAD"]).await?;
        let name = output.stdout.trim();
        if output.success() && !name.is_empty() {
            Ok(Some(name.to_string()))
        } else {
            Ok(None)
        }
    }

    async fn git(&self, args: &[&str]) -> DotpulseResult<CommandOutput> {
        // --no-optional-locks stops `status` from rewriting the index.
        let mut full = vec!["--no-optional-locks"];
        full.extend_from_slice(args);
        let spec = CommandSpec::new("git", &full).in_dir(self.repo);
        self.runner.run(&spec, self.timeout).await
    }
}

/// Count entries in `git status --porcelain` output
fn count_porcelain_entries(stdout: &str) -> u32 {
    let n = stdout.lines().filter(|l| !l.trim().is_empty()).count();
    u32::try_from(n).unwrap_or(u32::MAX)
}

/// Parse `git rev-list --left-right --count` output as (behind, ahead)
fn parse_left_right(stdout: &str) -> Option<(u32, u32)> {
    let mut parts = stdout.split_whitespace();
    let behind = parts.next()?.parse().ok()?;
    let ahead = parts.next()?.parse().ok()?;
    Some((behind, ahead))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::testing::MockRunner;
    use crate::exec::SystemRunner;
    use tempfile::TempDir;

    const TIMEOUT: Duration = Duration::from_secs(5);

    fn scripted(dirty: &str, upstream: bool, counts: &str) -> MockRunner {
        let mut runner = MockRunner::new()
            .installed(&["git"])
            .respond(
                "git --no-optional-locks rev-parse --is-inside-work-tree",
                0,
                "true\n",
            )
            .respond("git --no-optional-locks status --porcelain", 0, dirty)
            .respond(
                "git --no-optional-locks symbolic-ref --quiet --short HEAD",
                0,
                "main\n",
            );
        runner = if upstream {
            runner
                .respond(
                    "git --no-optional-locks rev-parse --abbrev-ref --symbolic-full-name @{upstream}",
                    0,
                    "origin/main\n",
                )
                .respond(
                    "git --no-optional-locks rev-list --left-right --count @{upstream}...HEAD",
                    0,
                    counts,
                )
        } else {
            runner.respond(
                "git --no-optional-locks rev-parse --abbrev-ref --symbolic-full-name @{upstream}",
                128,
                "",
            )
        };
        runner
    }

    #[tokio::test]
    async fn clean_up_to_date_repo() {
        let dir = TempDir::new().unwrap();
        let runner = scripted("", true, "0\t0\n");

        let payload = GitInspector::new(&runner, dir.path(), TIMEOUT)
            .inspect()
            .await
            .unwrap();

        assert!(payload.in_repo);
        assert_eq!(payload.uncommitted, 0);
        assert_eq!(payload.ahead, 0);
        assert_eq!(payload.behind, 0);
        assert_eq!(payload.branch.as_deref(), Some("main"));
        assert!(!payload.has_local_work());
    }

    #[tokio::test]
    async fn dirty_and_diverged_repo() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(" M zshrc\n?? new-file\n", true, "1\t2\n");

        let payload = GitInspector::new(&runner, dir.path(), TIMEOUT)
            .inspect()
            .await
            .unwrap();

        assert_eq!(payload.uncommitted, 2);
        assert_eq!(payload.behind, 1);
        assert_eq!(payload.ahead, 2);
        assert_eq!(payload.upstream.as_deref(), Some("origin/main"));
        assert!(payload.has_local_work());
    }

    #[tokio::test]
    async fn no_upstream_means_zero_divergence() {
        let dir = TempDir::new().unwrap();
        let runner = scripted("", false, "");

        let payload = GitInspector::new(&runner, dir.path(), TIMEOUT)
            .inspect()
            .await
            .unwrap();

        assert!(payload.upstream.is_none());
        assert_eq!((payload.ahead, payload.behind), (0, 0));
    }

    #[tokio::test]
    async fn missing_directory_is_not_a_repo() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new().installed(&["git"]);
        let missing = dir.path().join("absent");

        let payload = GitInspector::new(&runner, &missing, TIMEOUT)
            .inspect()
            .await
            .unwrap();

        assert_eq!(payload, GitPayload::not_a_repo());
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn missing_git_fails_the_refresh() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let result = GitInspector::new(&runner, dir.path(), TIMEOUT)
            .inspect()
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn only_read_only_git_commands_are_run() {
        let dir = TempDir::new().unwrap();
        let runner = scripted(" M a\n", true, "0\t1\n");
        GitInspector::new(&runner, dir.path(), TIMEOUT)
            .inspect()
            .await
            .unwrap();

        let read_only = ["rev-parse", "status", "symbolic-ref", "rev-list"];
        for call in runner.calls() {
            assert_eq!(call.program, "git");
            assert_eq!(call.args[0], "--no-optional-locks");
            assert!(read_only.contains(&call.args[1].as_str()), "{}", call);
        }
    }

    #[tokio::test]
    async fn real_git_fresh_repository_is_clean() {
        if !SystemRunner.program_exists("git") {
            return;
        }
        let dir = TempDir::new().unwrap();
        let init = SystemRunner
            .run(
                &CommandSpec::new("git", &["init", "-q"]).in_dir(dir.path()),
                TIMEOUT,
            )
            .await
            .unwrap();
        assert!(init.success());

        let payload = GitInspector::new(&SystemRunner, dir.path(), TIMEOUT)
            .inspect()
            .await
            .unwrap();

        assert!(payload.in_repo);
        assert_eq!((payload.uncommitted, payload.ahead, payload.behind), (0, 0, 0));
    }

    #[test]
    fn parse_left_right_counts() {
        assert_eq!(parse_left_right("3\t4\n"), Some((3, 4)));
        assert_eq!(parse_left_right(""), None);
        assert_eq!(parse_left_right("x 1"), None);
    }
}
