//! Rendering a [`Snapshot`] for humans, shell prompts and scripts
//!
//! Rendering never fails and never touches the network or the cache: it only
//! formats what the refresher served.

use crate::backends::UpdateState;
use crate::config::Config;
use crate::domains::{GitPayload, InitPayload, PackagesPayload};
use crate::refresh::{resolved_repo, DomainView, RefreshState, Snapshot};
use console::{style, Emoji, StyledObject};
use serde::Serialize;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::debug;

static CHECK: Emoji<'_, '_> = Emoji("✓ ", "[OK] ");
static WARN: Emoji<'_, '_> = Emoji("⚠ ", "[!] ");
static UNKNOWN: Emoji<'_, '_> = Emoji("? ", "[?] ");
static PACKAGE: Emoji<'_, '_> = Emoji("📦 ", "");
static BRANCH: Emoji<'_, '_> = Emoji("⎇ ", "");
static CLOCK: Emoji<'_, '_> = Emoji("⏰ ", "");

/// How much to say
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportMode {
    /// Full sectioned report
    Interactive,
    /// Only actionable lines; nothing at all when there is nothing to do
    Quiet,
    /// JSON for scripts
    Machine,
}

/// Formats snapshots relative to a point in time
#[derive(Debug, Clone)]
pub struct Reporter {
    now: i64,
    repo: PathBuf,
    max_age_days: u32,
}

impl Reporter {
    pub fn new(config: &Config, now: i64) -> Self {
        Self {
            now,
            repo: resolved_repo(config),
            max_age_days: config.init.max_age_days,
        }
    }

    pub fn render(&self, mode: ReportMode, snapshot: &Snapshot) -> String {
        match mode {
            ReportMode::Interactive => self.interactive(snapshot),
            ReportMode::Quiet => self.quiet(snapshot),
            ReportMode::Machine => machine(snapshot),
        }
    }

    /// Actionable lines only
    fn quiet(&self, snapshot: &Snapshot) -> String {
        let mut lines = Vec::new();

        let packages = &snapshot.packages.payload;
        if packages.total_updates > 0 {
            lines.push(format!(
                "{}{} available",
                PACKAGE,
                plural(packages.total_updates, "package update", "package updates")
            ));
        } else if packages.has_updates() {
            let names: Vec<&str> = packages.with_updates().map(|(name, _)| name).collect();
            lines.push(format!(
                "{}Package updates available ({})",
                PACKAGE,
                names.join(", ")
            ));
        }

        let git = &snapshot.git.payload;
        if git.in_repo && git.uncommitted > 0 {
            lines.push(format!(
                "{}{} in {}",
                BRANCH,
                plural(git.uncommitted.into(), "uncommitted change", "uncommitted changes"),
                self.repo_label()
            ));
        }
        if git.in_repo && git.ahead > 0 {
            lines.push(format!(
                "{}{} in {}",
                BRANCH,
                plural(git.ahead.into(), "unpushed commit", "unpushed commits"),
                self.repo_label()
            ));
        }

        let init = &snapshot.init.payload;
        if init.is_overdue() {
            let line = if init.last_run <= 0 {
                format!("{}Provisioning has never run on this host", CLOCK)
            } else {
                format!(
                    "{}Provisioning last ran {}",
                    CLOCK,
                    format_age(self.now - init.last_run)
                )
            };
            lines.push(line);
        }

        let mut out = String::new();
        for line in lines {
            let _ = writeln!(out, "{}", style(line).yellow());
        }
        out
    }

    fn interactive(&self, snapshot: &Snapshot) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", style("dotpulse status").bold().cyan());

        self.packages_section(&mut out, &snapshot.packages);
        self.git_section(&mut out, &snapshot.git);
        self.init_section(&mut out, &snapshot.init);
        out
    }

    fn section_header<P>(&self, out: &mut String, title: &str, view: &DomainView<P>) {
        let _ = writeln!(out);
        let checked = if view.never_checked() {
            String::new()
        } else {
            format!(" checked {}", format_age(self.now - view.last_check))
        };
        let _ = writeln!(
            out,
            "{}{}{}",
            style(format!("{}:", title)).bold(),
            style(checked).dim(),
            freshness_tag(view.state)
        );
    }

    fn packages_section(&self, out: &mut String, view: &DomainView<PackagesPayload>) {
        self.section_header(out, "Packages", view);
        if view.never_checked() {
            let _ = writeln!(out, "  {}{}", UNKNOWN, style("not checked yet").dim());
            return;
        }

        let payload = &view.payload;
        if payload.managers.is_empty() {
            let _ = writeln!(out, "  {}No supported package managers found", UNKNOWN);
            return;
        }

        if payload.has_updates() {
            let summary = if payload.total_updates > 0 {
                format!(
                    "{} available",
                    plural(payload.total_updates, "update", "updates")
                )
            } else {
                "Updates available".to_string()
            };
            let _ = writeln!(out, "  {}{}", WARN, style(summary).yellow());
        } else {
            let _ = writeln!(out, "  {}{}", CHECK, style("Up to date").green());
        }

        let width = payload.managers.keys().map(String::len).max().unwrap_or(0);
        for (name, status) in &payload.managers {
            let detail = match status.has_updates {
                UpdateState::NoUpdates => style("up to date".to_string()).green(),
                UpdateState::UpdatesAvailable => match status.count {
                    Some(n) => style(plural(n.into(), "update", "updates")).yellow(),
                    None => style("updates available".to_string()).yellow(),
                },
                UpdateState::CannotDetermine => unable(status.reason.as_deref()),
            };
            let _ = writeln!(out, "    {:<width$}  {}", name, detail, width = width);
        }
    }

    fn git_section(&self, out: &mut String, view: &DomainView<GitPayload>) {
        self.section_header(out, &format!("Git ({})", self.repo_label()), view);
        if view.never_checked() {
            let _ = writeln!(out, "  {}{}", UNKNOWN, style("not checked yet").dim());
            return;
        }

        let git = &view.payload;
        if !git.in_repo {
            let _ = writeln!(out, "  {}{}", UNKNOWN, style("not a git repository").dim());
            return;
        }

        let branch = git.branch.as_deref().unwrap_or("(detached HEAD)");
        match &git.upstream {
            Some(upstream) => {
                let _ = writeln!(out, "  {}{} tracking {}", CHECK, branch, upstream);
            }
            None => {
                let _ = writeln!(out, "  {}{} {}", CHECK, branch, style("(no upstream)").dim());
            }
        }

        if git.uncommitted > 0 {
            let _ = writeln!(
                out,
                "  {}{}",
                WARN,
                style(plural(git.uncommitted.into(), "uncommitted change", "uncommitted changes"))
                    .yellow()
            );
        }
        if git.ahead > 0 {
            let _ = writeln!(
                out,
                "  {}{}",
                WARN,
                style(plural(git.ahead.into(), "commit ahead", "commits ahead")).yellow()
            );
        }
        if git.behind > 0 {
            let _ = writeln!(
                out,
                "  {}{}",
                WARN,
                style(plural(git.behind.into(), "commit behind", "commits behind")).yellow()
            );
        }
        if !git.has_local_work() && git.behind == 0 {
            let _ = writeln!(out, "  {}{}", CHECK, style("Clean").green());
        }
    }

    fn init_section(&self, out: &mut String, view: &DomainView<InitPayload>) {
        self.section_header(out, "Provisioning", view);
        if view.never_checked() {
            let _ = writeln!(out, "  {}{}", UNKNOWN, style("not checked yet").dim());
            return;
        }

        let init = &view.payload;
        if !init.in_managed_tree {
            let _ = writeln!(out, "  {}{}", UNKNOWN, style("managed tree not found").dim());
        }

        let last = if init.last_run <= 0 {
            "never run".to_string()
        } else {
            format!("last run {}", format_age(self.now - init.last_run))
        };

        if init.needs_update {
            let _ = writeln!(
                out,
                "  {}{} {}",
                WARN,
                style(last).yellow(),
                style(format!("(older than {} days)", self.max_age_days)).dim()
            );
        } else {
            let _ = writeln!(out, "  {}{}", CHECK, style(last).green());
        }
    }

    fn repo_label(&self) -> String {
        if let Some(home) = dirs::home_dir() {
            let home = std::fs::canonicalize(&home).unwrap_or(home);
            if let Ok(rest) = self.repo.strip_prefix(&home) {
                return format!("~/{}", rest.display());
            }
        }
        self.repo.display().to_string()
    }
}

#[derive(Serialize)]
struct MachineView<'a, P> {
    last_check: i64,
    state: RefreshState,
    stale: bool,
    #[serde(flatten)]
    payload: &'a P,
}

impl<'a, P> From<&'a DomainView<P>> for MachineView<'a, P> {
    fn from(view: &'a DomainView<P>) -> Self {
        Self {
            last_check: view.last_check,
            state: view.state,
            stale: view.is_stale(),
            payload: &view.payload,
        }
    }
}

#[derive(Serialize)]
struct MachineReport<'a> {
    packages: MachineView<'a, PackagesPayload>,
    git: MachineView<'a, GitPayload>,
    init: MachineView<'a, InitPayload>,
}

fn machine(snapshot: &Snapshot) -> String {
    let report = MachineReport {
        packages: (&snapshot.packages).into(),
        git: (&snapshot.git).into(),
        init: (&snapshot.init).into(),
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => json + "\n",
        Err(e) => {
            debug!("Failed to serialize status: {}", e);
            "{}\n".to_string()
        }
    }
}

fn freshness_tag(state: RefreshState) -> StyledObject<&'static str> {
    match state {
        RefreshState::Fresh => style(""),
        RefreshState::Stale => style(" (stale)").dim(),
        RefreshState::Refreshing => style(" (refreshing)").dim(),
    }
}

fn unable(reason: Option<&str>) -> StyledObject<String> {
    match reason {
        Some(reason) => style(format!("unable to determine ({})", reason)).dim(),
        None => style("unable to determine".to_string()).dim(),
    }
}

fn plural(n: u64, one: &str, many: &str) -> String {
    if n == 1 {
        format!("1 {}", one)
    } else {
        format!("{} {}", n, many)
    }
}

/// Coarse relative age, e.g. `5m ago`
pub fn format_age(secs: i64) -> String {
    match secs {
        s if s < 60 => "just now".to_string(),
        s if s < 60 * 60 => format!("{}m ago", s / 60),
        s if s < 24 * 60 * 60 => format!("{}h ago", s / (60 * 60)),
        s => format!("{}d ago", s / (24 * 60 * 60)),
    }
}
