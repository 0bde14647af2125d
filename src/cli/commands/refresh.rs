//! Refresh command - recompute domains now

use crate::cache::{epoch_now, CacheStore};
use crate::cli::args::RefreshArgs;
use crate::config::Config;
use crate::domains::Domain;
use crate::error::{DotpulseError, DotpulseResult};
use crate::exec::SystemRunner;
use crate::refresh::{DisabledLauncher, Refresher};
use crate::ui::{self, TaskSpinner, UiContext};
use std::sync::Arc;
use tracing::info;

/// Execute the refresh command
pub async fn execute(args: RefreshArgs, config: &Config) -> DotpulseResult<()> {
    let domains = selected_domains(&args.domains);
    let names: Vec<&str> = domains.iter().map(Domain::name).collect();

    let store = CacheStore::open(config.cache_dir()).await?;
    let refresher = Refresher::new(
        config.clone(),
        store,
        Arc::new(SystemRunner),
        Arc::new(DisabledLauncher),
    );

    if args.background {
        info!(domains = ?names, pid = std::process::id(), "background refresh started");
        // Outcomes are logged by the refresher; a failed refresh keeps the
        // previous entry and there is nobody to report to.
        refresher.refresh_all(&domains, epoch_now()).await;
        return Ok(());
    }

    let ctx = UiContext::detect();
    let mut spinner = TaskSpinner::new(&ctx);
    spinner.start(&format!("Refreshing {}", names.join(", ")));

    let results = refresher.refresh_all(&domains, epoch_now()).await;
    let failed: Vec<(Domain, DotpulseError)> = results
        .into_iter()
        .filter_map(|(domain, result)| result.err().map(|e| (domain, e)))
        .collect();

    if failed.is_empty() {
        spinner.stop(&format!("Refreshed {}", names.join(", ")));
        return Ok(());
    }

    spinner.stop_error(&format!(
        "{} of {} domain(s) failed to refresh",
        failed.len(),
        domains.len()
    ));
    for (domain, e) in &failed {
        ui::step_error_detail(&ctx, domain.name(), &e.to_string());
    }
    ui::remark(&ctx, "Previous cache entries were kept");

    Err(DotpulseError::refresh_failed(
        failed
            .iter()
            .map(|(d, _)| d.name())
            .collect::<Vec<_>>()
            .join(", "),
        "see above",
    ))
}

/// Requested domains in report order without repeats; none means all
fn selected_domains(requested: &[Domain]) -> Vec<Domain> {
    if requested.is_empty() {
        return Domain::ALL.to_vec();
    }
    Domain::ALL
        .into_iter()
        .filter(|d| requested.contains(d))
        .collect()
}
