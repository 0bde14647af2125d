//! Stale-while-revalidate access to the domain cache
//!
//! Per domain the refresher cycles through three states:
//!
//! | State | Meaning |
//! |-------|---------|
//! | Fresh | entry younger than the domain TTL, served as is |
//! | Stale | entry expired (or absent) and no refresh could be started |
//! | Refreshing | entry expired, a detached refresh was started; the old payload is served |
//!
//! Reads never wait on a refresh. A refresh writes its result through the
//! cache store's atomic rename; if it fails the previous entry stays put.

pub mod launcher;

pub use launcher::{DetachedProcess, DisabledLauncher, RefreshLauncher};

use crate::cache::{CacheEntry, CacheKey, CacheStore};
use crate::config::Config;
use crate::domains::{
    Domain, DomainPayload, GitInspector, GitPayload, InitInspector, InitPayload, PackagesPayload,
};
use crate::error::DotpulseResult;
use crate::exec::CommandRunner;
use crate::orchestrator::UpdateOrchestrator;
use futures_util::future::join_all;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Freshness of a served payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshState {
    Fresh,
    Stale,
    Refreshing,
}

/// A domain payload as served to the reporter
#[derive(Debug, Clone, PartialEq)]
pub struct DomainView<P> {
    pub payload: P,
    /// 0 when the domain has never been checked
    pub last_check: i64,
    pub state: RefreshState,
}

impl<P> DomainView<P> {
    pub fn is_stale(&self) -> bool {
        self.state != RefreshState::Fresh
    }

    pub fn never_checked(&self) -> bool {
        self.last_check <= 0
    }
}

/// All three domains as seen by one invocation
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub packages: DomainView<PackagesPayload>,
    pub git: DomainView<GitPayload>,
    pub init: DomainView<InitPayload>,
}

/// Repository inspected by the git domain, resolved to a stable path
pub fn resolved_repo(config: &Config) -> PathBuf {
    let repo = config.git_repo();
    std::fs::canonicalize(&repo).unwrap_or(repo)
}

/// Where `domain` is cached; git entries are per repository
pub fn cache_key(config: &Config, domain: Domain) -> CacheKey {
    match domain {
        Domain::Git => CacheKey::scoped(domain, &resolved_repo(config)),
        _ => CacheKey::domain(domain),
    }
}

/// Serves cached domain data and keeps it up to date
pub struct Refresher {
    config: Config,
    store: CacheStore,
    runner: Arc<dyn CommandRunner>,
    launcher: Arc<dyn RefreshLauncher>,
}

impl Refresher {
    pub fn new(
        config: Config,
        store: CacheStore,
        runner: Arc<dyn CommandRunner>,
        launcher: Arc<dyn RefreshLauncher>,
    ) -> Self {
        Self {
            config,
            store,
            runner,
            launcher,
        }
    }

    pub fn store(&self) -> &CacheStore {
        &self.store
    }

    /// Repository inspected by the git domain
    pub fn repo(&self) -> PathBuf {
        resolved_repo(&self.config)
    }

    /// Cache key of a domain
    pub fn key_for(&self, domain: Domain) -> CacheKey {
        cache_key(&self.config, domain)
    }

    /// Serve a domain's cached payload, starting a background refresh if it
    /// has expired. Never waits for that refresh.
    pub async fn get<P: DomainPayload>(&self, now: i64) -> DomainView<P> {
        let domain = P::DOMAIN;
        let ttl = self.config.ttl_for(domain);

        match self.store.read::<P>(&self.key_for(domain)).await {
            Some(entry) if !entry.is_stale(now, ttl) => DomainView {
                payload: entry.payload,
                last_check: entry.last_check,
                state: RefreshState::Fresh,
            },
            cached => {
                let state = if self.launcher.launch(domain) {
                    RefreshState::Refreshing
                } else {
                    RefreshState::Stale
                };
                let (payload, last_check) = cached
                    .map(|e| (e.payload, e.last_check))
                    .unwrap_or_default();
                DomainView {
                    payload,
                    last_check,
                    state,
                }
            }
        }
    }

    /// Serve all three domains
    pub async fn snapshot(&self, now: i64) -> Snapshot {
        let (packages, git, init) = tokio::join!(
            self.get::<PackagesPayload>(now),
            self.get::<GitPayload>(now),
            self.get::<InitPayload>(now),
        );
        Snapshot {
            packages,
            git,
            init,
        }
    }

    /// Recompute one domain and persist it.
    ///
    /// On error nothing is written, so the previous entry stays authoritative.
    pub async fn refresh(&self, domain: Domain, now: i64) -> DotpulseResult<()> {
        let started = Instant::now();

        let result = match domain {
            Domain::Packages => self.refresh_packages(now).await,
            Domain::Git => self.refresh_git(now).await,
            Domain::Init => self.refresh_init(now).await,
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(()) => info!(domain = domain.name(), elapsed_ms, "refresh completed"),
            Err(e) => warn!(domain = domain.name(), elapsed_ms, error = %e, "refresh failed"),
        }
        result
    }

    /// Refresh several domains concurrently; they share no ordering
    pub async fn refresh_all(
        &self,
        domains: &[Domain],
        now: i64,
    ) -> Vec<(Domain, DotpulseResult<()>)> {
        let results = join_all(domains.iter().map(|&d| self.refresh(d, now))).await;
        domains.iter().copied().zip(results).collect()
    }

    async fn refresh_packages(&self, now: i64) -> DotpulseResult<()> {
        let orchestrator =
            UpdateOrchestrator::from_config(&self.config.packages, Arc::clone(&self.runner))?;
        let payload = orchestrator.run().await;
        self.persist(now, &payload).await
    }

    async fn refresh_git(&self, now: i64) -> DotpulseResult<()> {
        let repo = self.repo();
        let timeout = Duration::from_secs(self.config.git.timeout_secs);
        let payload = GitInspector::new(self.runner.as_ref(), &repo, timeout)
            .inspect()
            .await?;
        self.persist(now, &payload).await
    }

    async fn refresh_init(&self, now: i64) -> DotpulseResult<()> {
        let inspector = InitInspector::new(
            self.config.managed_tree(),
            self.config.stamp_file(),
            self.config.init.max_age_secs(),
        );
        let payload = inspector.inspect(now).await?;
        self.persist(now, &payload).await
    }

    async fn persist<P: DomainPayload>(&self, now: i64, payload: &P) -> DotpulseResult<()> {
        let entry = CacheEntry::new(now, payload.clone());
        self.store.write(&self.key_for(P::DOMAIN), &entry).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::UpdateState;
    use crate::exec::testing::MockRunner;
    use crate::report::{ReportMode, Reporter};
    use std::sync::Mutex;
    use tempfile::TempDir;

    const NOW: i64 = 1_700_000_000;

    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<Domain>>,
    }

    impl RecordingLauncher {
        fn launched(&self) -> Vec<Domain> {
            self.launched.lock().unwrap().clone()
        }
    }

    impl RefreshLauncher for RecordingLauncher {
        fn launch(&self, domain: Domain) -> bool {
            self.launched.lock().unwrap().push(domain);
            true
        }
    }

    fn test_config(temp: &TempDir) -> Config {
        let mut config = Config::default();
        config.cache.dir = Some(temp.path().join("cache"));
        config.packages.backends = Some(vec!["brew".to_string(), "pipx".to_string()]);
        config.git.repo = Some(temp.path().join("repo"));
        config.init.managed_tree = Some(temp.path().join("dotfiles"));
        config.init.stamp_file = Some(temp.path().join("last-init"));
        config
    }

    fn brew_runner(outdated: &str) -> MockRunner {
        MockRunner::new()
            .installed(&["brew", "pipx"])
            .respond("brew outdated --quiet", 0, outdated)
    }

    async fn refresher(
        temp: &TempDir,
        runner: MockRunner,
    ) -> (Refresher, Arc<RecordingLauncher>) {
        let config = test_config(temp);
        let store = CacheStore::open(config.cache_dir()).await.unwrap();
        let launcher = Arc::new(RecordingLauncher::default());
        let refresher = Refresher::new(config, store, Arc::new(runner), launcher.clone());
        (refresher, launcher)
    }

    #[tokio::test]
    async fn absent_entry_schedules_refresh_and_serves_placeholder() {
        let temp = TempDir::new().unwrap();
        let (refresher, launcher) = refresher(&temp, brew_runner("")).await;

        let view = refresher.get::<PackagesPayload>(NOW).await;

        assert_eq!(view.state, RefreshState::Refreshing);
        assert!(view.never_checked());
        assert_eq!(view.payload, PackagesPayload::default());
        assert_eq!(launcher.launched(), vec![Domain::Packages]);
    }

    #[tokio::test]
    async fn fresh_entry_is_served_without_refresh() {
        let temp = TempDir::new().unwrap();
        let (refresher, launcher) = refresher(&temp, brew_runner("git\n")).await;
        refresher.refresh(Domain::Packages, NOW).await.unwrap();

        let view = refresher.get::<PackagesPayload>(NOW + 60).await;

        assert_eq!(view.state, RefreshState::Fresh);
        assert_eq!(view.last_check, NOW);
        assert_eq!(view.payload.total_updates, 1);
        assert!(launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn stale_entry_is_served_while_refreshing() {
        let temp = TempDir::new().unwrap();
        let (refresher, launcher) = refresher(&temp, brew_runner("git\nvim\n")).await;
        refresher.refresh(Domain::Packages, NOW).await.unwrap();

        let later = NOW + 7 * 60 * 60;
        let view = refresher.get::<PackagesPayload>(later).await;

        assert_eq!(view.state, RefreshState::Refreshing);
        assert!(view.is_stale());
        assert_eq!(view.payload.total_updates, 2);
        assert_eq!(launcher.launched(), vec![Domain::Packages]);
    }

    #[tokio::test]
    async fn disabled_launcher_reports_plain_stale() {
        let temp = TempDir::new().unwrap();
        let config = test_config(&temp);
        let store = CacheStore::open(config.cache_dir()).await.unwrap();
        let refresher = Refresher::new(
            config,
            store,
            Arc::new(brew_runner("")),
            Arc::new(DisabledLauncher),
        );

        let view = refresher.get::<InitPayload>(NOW).await;
        assert_eq!(view.state, RefreshState::Stale);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_entry() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("repo")).unwrap();
        // git is not installed on this mock host
        let (refresher, _) = refresher(&temp, MockRunner::new()).await;

        let previous = CacheEntry::new(
            NOW - 10,
            GitPayload {
                in_repo: true,
                uncommitted: 4,
                ..GitPayload::default()
            },
        );
        let key = refresher.key_for(Domain::Git);
        refresher.store().write(&key, &previous).await.unwrap();

        assert!(refresher.refresh(Domain::Git, NOW).await.is_err());

        let kept: CacheEntry<GitPayload> = refresher.store().read(&key).await.unwrap();
        assert_eq!(kept, previous);
    }

    #[tokio::test]
    async fn refreshing_twice_yields_identical_payload() {
        let temp = TempDir::new().unwrap();
        let (refresher, _) = refresher(&temp, brew_runner("git\nvim\n")).await;
        let key = refresher.key_for(Domain::Packages);

        refresher.refresh(Domain::Packages, NOW).await.unwrap();
        let first: CacheEntry<PackagesPayload> = refresher.store().read(&key).await.unwrap();
        refresher.refresh(Domain::Packages, NOW + 1).await.unwrap();
        let second: CacheEntry<PackagesPayload> = refresher.store().read(&key).await.unwrap();

        assert_eq!(first.payload, second.payload);
    }

    #[tokio::test]
    async fn refresh_all_covers_every_domain() {
        let temp = TempDir::new().unwrap();
        let runner = brew_runner("")
            .installed(&["git"])
            .respond(
                "git --no-optional-locks rev-parse --is-inside-work-tree",
                128,
                "",
            );
        std::fs::create_dir_all(temp.path().join("repo")).unwrap();
        let (refresher, launcher) = refresher(&temp, runner).await;

        let results = refresher.refresh_all(&Domain::ALL, NOW).await;
        assert!(results.iter().all(|(_, r)| r.is_ok()));

        let snapshot = refresher.snapshot(NOW).await;
        assert_eq!(snapshot.packages.state, RefreshState::Fresh);
        assert_eq!(snapshot.git.state, RefreshState::Fresh);
        assert!(!snapshot.git.payload.in_repo);
        assert_eq!(snapshot.init.state, RefreshState::Fresh);
        assert!(launcher.launched().is_empty());
    }

    #[tokio::test]
    async fn quiet_report_before_and_after_first_refresh() {
        let temp = TempDir::new().unwrap();
        let (refresher, launcher) = refresher(&temp, brew_runner("a\nb\nc\nd\ne\n")).await;
        let config = test_config(&temp);

        let before = refresher.snapshot(NOW).await;
        let quiet = Reporter::new(&config, NOW).render(ReportMode::Quiet, &before);
        assert!(quiet.is_empty(), "unexpected output: {}", quiet);
        assert!(launcher.launched().contains(&Domain::Packages));

        refresher.refresh(Domain::Packages, NOW).await.unwrap();

        let after = refresher.snapshot(NOW + 1).await;
        assert_eq!(after.packages.payload.total_updates, 5);
        assert_eq!(
            after.packages.payload.managers["pipx"].has_updates,
            UpdateState::CannotDetermine
        );
        let quiet = Reporter::new(&config, NOW + 1).render(ReportMode::Quiet, &after);
        let lines: Vec<&str> = quiet.lines().collect();
        assert_eq!(lines.len(), 1, "unexpected output: {}", quiet);
        assert!(lines[0].contains('5'));
    }
}
