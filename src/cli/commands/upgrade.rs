//! Upgrade command - apply pending package updates
//!
//! The only code path that runs a backend's mutating command.

use crate::backends::{ApplyResult, Backend};
use crate::cache::{CacheKey, CacheStore};
use crate::cli::args::UpgradeArgs;
use crate::config::Config;
use crate::domains::Domain;
use crate::error::{DotpulseError, DotpulseResult};
use crate::exec::{CommandRunner, SystemRunner};
use crate::orchestrator;
use crate::ui::{self, UiContext, UpgradeProgress};
use tracing::{debug, warn};

/// Execute the upgrade command
pub async fn execute(args: UpgradeArgs, config: &Config) -> DotpulseResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let runner = SystemRunner;

    let targets = select_backends(config, &args.backends, &runner)?;
    if targets.is_empty() {
        ui::step_info(&ctx, "No installed package managers to upgrade");
        return Ok(());
    }

    ui::intro(&ctx, "dotpulse upgrade");
    for backend in &targets {
        ui::key_value(&ctx, backend.name(), &backend.apply_command().to_string());
    }

    if args.dry_run {
        ui::remark(&ctx, "Dry run: nothing was executed");
        return Ok(());
    }

    let prompt = format!("Run {} upgrade command(s)?", targets.len());
    if !ui::confirm(&ctx, &prompt, false).await? {
        ui::outro_warn(&ctx, "Upgrade cancelled");
        return Ok(());
    }

    let results = run_upgrades(&ctx, &targets, &runner, config).await;

    if results.iter().any(|r| r.executed) {
        invalidate_packages(config).await;
    }

    let failed: Vec<&ApplyResult> = results.iter().filter(|r| !r.success).collect();
    for result in &results {
        if result.success {
            ui::step_ok(&ctx, &format!("{} upgraded", result.backend));
        } else {
            let detail = result.detail.as_deref().unwrap_or("no output");
            ui::step_error_detail(&ctx, &format!("{} failed", result.command), detail);
        }
    }

    if failed.is_empty() {
        ui::outro_success(&ctx, "All package managers upgraded");
        Ok(())
    } else {
        ui::outro_warn(
            &ctx,
            &format!("{} of {} upgrade(s) failed", failed.len(), results.len()),
        );
        Err(DotpulseError::User(format!(
            "Upgrade failed for: {}",
            failed
                .iter()
                .map(|r| r.backend.name())
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

/// Backends to upgrade: the named ones, or the configured registry, limited
/// to those installed here
fn select_backends(
    config: &Config,
    names: &[String],
    runner: &dyn CommandRunner,
) -> DotpulseResult<Vec<Backend>> {
    let candidates = if names.is_empty() {
        orchestrator::registry(&config.packages)?
    } else {
        names
            .iter()
            .map(|n| n.parse())
            .collect::<DotpulseResult<Vec<Backend>>>()?
    };

    let mut selected: Vec<Backend> = candidates
        .into_iter()
        .filter(|b| b.is_available(runner))
        .collect();
    selected.sort();
    selected.dedup();
    Ok(selected)
}

/// Run each upgrade in turn; they share package databases and sudo
async fn run_upgrades(
    ctx: &UiContext,
    targets: &[Backend],
    runner: &dyn CommandRunner,
    config: &Config,
) -> Vec<ApplyResult> {
    let progress = UpgradeProgress::new(ctx, targets.len());
    let mut results = Vec::with_capacity(targets.len());

    for (i, backend) in targets.iter().enumerate() {
        progress.start(i, backend.name());
        let result = backend
            .apply(runner, false, config.packages.upgrade_timeout())
            .await;
        debug!("{} upgrade: success={}", backend, result.success);
        results.push(result);
    }

    progress.finish();
    results
}

/// Drop the packages entry so the next status recomputes it
async fn invalidate_packages(config: &Config) {
    let key = CacheKey::domain(Domain::Packages);
    match CacheStore::open(config.cache_dir()).await {
        Ok(store) => {
            if let Err(e) = store.remove(&key).await {
                warn!("Could not invalidate packages cache: {}", e);
            }
        }
        Err(e) => warn!("Could not open cache to invalidate packages: {}", e),
    }
}
