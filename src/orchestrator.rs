//! Update orchestration across package manager backends
//!
//! Runs every available backend's read-only check concurrently, each under
//! its own timeout, and reduces the results into one [`PackagesPayload`].
//! Nothing here ever calls [`Backend::apply`].

use crate::backends::{Backend, BackendCheckResult};
use crate::config::schema::PackagesConfig;
use crate::domains::PackagesPayload;
use crate::error::DotpulseResult;
use crate::exec::CommandRunner;
use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Slack granted on top of a backend's own timeout before it is abandoned
const TIMEOUT_GRACE: Duration = Duration::from_secs(2);

/// Polls a registry of backends
pub struct UpdateOrchestrator {
    backends: Vec<Backend>,
    runner: Arc<dyn CommandRunner>,
    check_timeout: Duration,
}

impl UpdateOrchestrator {
    pub fn new(backends: Vec<Backend>, runner: Arc<dyn CommandRunner>, check_timeout: Duration) -> Self {
        Self {
            backends,
            runner,
            check_timeout,
        }
    }

    /// Build the registry from the `[packages]` config section
    pub fn from_config(config: &PackagesConfig, runner: Arc<dyn CommandRunner>) -> DotpulseResult<Self> {
        let backends = registry(config)?;
        Ok(Self::new(backends, runner, config.check_timeout()))
    }

    /// Registered backends
    pub fn backends(&self) -> &[Backend] {
        &self.backends
    }

    /// Registered backends whose tool is installed
    pub fn available(&self) -> Vec<Backend> {
        self.backends
            .iter()
            .copied()
            .filter(|b| b.is_available(self.runner.as_ref()))
            .collect()
    }

    /// Check every available backend and fold the results.
    ///
    /// Unavailable backends are left out entirely. A backend that times out
    /// or panics is recorded as `CANNOT_DETERMINE` without affecting the rest.
    pub async fn run(&self) -> PackagesPayload {
        let available = self.available();
        debug!(
            "Checking {} backend(s): {:?}",
            available.len(),
            available.iter().map(Backend::name).collect::<Vec<_>>()
        );

        let handles = available.iter().map(|&backend| {
            let runner = Arc::clone(&self.runner);
            let timeout = self.check_timeout;
            tokio::spawn(async move {
                match tokio::time::timeout(
                    timeout + TIMEOUT_GRACE,
                    backend.check(runner.as_ref(), timeout),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_) => BackendCheckResult::cannot_determine(format!(
                        "check did not finish within {}s",
                        timeout.as_secs()
                    )),
                }
            })
        });

        let results = join_all(handles).await;

        let reduced = available.into_iter().zip(results).map(|(backend, joined)| {
            let result = joined.unwrap_or_else(|e| {
                warn!("{} check aborted: {}", backend, e);
                BackendCheckResult::cannot_determine("check aborted unexpectedly")
            });
            debug!("{}: {:?}", backend, result);
            (backend, result)
        });

        PackagesPayload::from_results(reduced)
    }
}

/// Resolve configured backend names; absent means every known backend
pub fn registry(config: &PackagesConfig) -> DotpulseResult<Vec<Backend>> {
    match &config.backends {
        None => Ok(Backend::ALL.to_vec()),
        Some(names) => names.iter().map(|n| n.parse()).collect(),
    }
}
