//! Fire-and-forget background refresh
//!
//! The detached child re-runs this binary as `dotpulse refresh <domain>
//! --background` in its own process group, so it outlives both the
//! invocation that noticed the staleness and the shell that started it. Nothing waits for it;
//! its only effect is the cache file it renames into place.

use crate::domains::Domain;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, warn};

/// Starts a refresh without waiting for it
pub trait RefreshLauncher: Send + Sync {
    /// Returns whether a refresh was started
    fn launch(&self, domain: Domain) -> bool;
}

/// Launcher used when background refresh is disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledLauncher;

impl RefreshLauncher for DisabledLauncher {
    fn launch(&self, domain: Domain) -> bool {
        debug!("Background refresh disabled, {} stays stale", domain);
        false
    }
}

/// Spawns a detached copy of the current executable
#[derive(Debug, Clone)]
pub struct DetachedProcess {
    exe: PathBuf,
    global_args: Vec<OsString>,
}

impl DetachedProcess {
    pub fn new(exe: PathBuf) -> Self {
        Self {
            exe,
            global_args: Vec::new(),
        }
    }

    /// Launch the currently running binary
    pub fn current() -> std::io::Result<Self> {
        std::env::current_exe().map(Self::new)
    }

    /// Forward the settings the parent resolved so the child agrees on them
    pub fn forwarding(mut self, config: Option<&Path>, cache_dir: &Path, repo: &Path) -> Self {
        if let Some(config) = config {
            self.global_args.push("--config".into());
            self.global_args.push(config.into());
        }
        self.global_args.push("--cache-dir".into());
        self.global_args.push(cache_dir.into());
        self.global_args.push("--repo".into());
        self.global_args.push(repo.into());
        self
    }

    /// Full argument list for a refresh of `domain`
    pub fn args_for(&self, domain: Domain) -> Vec<OsString> {
        let mut args = self.global_args.clone();
        args.push("refresh".into());
        args.push(domain.name().into());
        args.push("--background".into());
        args
    }
}

impl RefreshLauncher for DetachedProcess {
    fn launch(&self, domain: Domain) -> bool {
        let mut cmd = Command::new(&self.exe);
        cmd.args(self.args_for(domain))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        // Own process group, out of reach of the shell's job control
        #[cfg(unix)]
        cmd.process_group(0);

        match cmd.spawn() {
            Ok(child) => {
                debug!(
                    "Started background refresh of {} (pid {:?})",
                    domain,
                    child.id()
                );
                true
            }
            Err(e) => {
                warn!("Could not start background refresh of {}: {}", domain, e);
                false
            }
        }
    }
}
