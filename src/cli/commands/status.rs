//! Status command - report cached domain state

use crate::cache::{epoch_now, CacheStore};
use crate::cli::args::StatusArgs;
use crate::config::Config;
use crate::domains::Domain;
use crate::error::DotpulseResult;
use crate::exec::SystemRunner;
use crate::refresh::{DetachedProcess, DisabledLauncher, RefreshLauncher, Refresher};
use crate::report::{ReportMode, Reporter};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Execute the status command
///
/// Only a cache directory that cannot be created makes this fail; every
/// other problem shows up as stale or indeterminate data.
pub async fn execute(
    args: StatusArgs,
    config: &Config,
    config_path: Option<&Path>,
) -> DotpulseResult<()> {
    if !config.general.enabled {
        debug!("dotpulse is disabled in the configuration");
        return Ok(());
    }

    let store = CacheStore::open(config.cache_dir()).await?;
    let launcher = launcher_for(&args, config, config_path);
    let refresher = Refresher::new(config.clone(), store, Arc::new(SystemRunner), launcher);

    if args.refresh {
        refresher.refresh_all(&Domain::ALL, epoch_now()).await;
    }

    let now = epoch_now();
    let snapshot = refresher.snapshot(now).await;

    let mode = if args.json {
        ReportMode::Machine
    } else if args.quiet {
        ReportMode::Quiet
    } else {
        ReportMode::Interactive
    };
    print!("{}", Reporter::new(config, now).render(mode, &snapshot));

    Ok(())
}

fn launcher_for(
    args: &StatusArgs,
    config: &Config,
    config_path: Option<&Path>,
) -> Arc<dyn RefreshLauncher> {
    // A synchronous refresh already ran, nothing left to schedule
    if args.refresh || !config.general.background_refresh {
        return Arc::new(DisabledLauncher);
    }

    match DetachedProcess::current() {
        Ok(launcher) => Arc::new(launcher.forwarding(
            config_path,
            &config.cache_dir(),
            &config.git_repo(),
        )),
        Err(e) => {
            warn!("Cannot locate own executable, background refresh disabled: {}", e);
            Arc::new(DisabledLauncher)
        }
    }
}
