//! Backends command - list package manager integrations

use crate::backends::Backend;
use crate::cli::args::{BackendsArgs, OutputFormat};
use crate::config::Config;
use crate::error::DotpulseResult;
use crate::exec::{CommandRunner, SystemRunner};
use crate::orchestrator;
use console::style;
use serde::Serialize;

/// One row of the listing
#[derive(Debug, Serialize)]
struct BackendRow {
    name: &'static str,
    enabled: bool,
    installed: bool,
    check: Option<String>,
    upgrade: String,
}

/// Execute the backends command
pub async fn execute(args: BackendsArgs, config: &Config) -> DotpulseResult<()> {
    let rows = collect(config, &SystemRunner)?;

    match args.format {
        OutputFormat::Table => print_table(&rows),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Plain => rows
            .iter()
            .filter(|r| r.enabled && r.installed)
            .for_each(|r| println!("{}", r.name)),
    }

    Ok(())
}

fn collect(config: &Config, runner: &dyn CommandRunner) -> DotpulseResult<Vec<BackendRow>> {
    let enabled = orchestrator::registry(&config.packages)?;

    Ok(Backend::ALL
        .into_iter()
        .map(|backend| BackendRow {
            name: backend.name(),
            enabled: enabled.contains(&backend),
            installed: backend.is_available(runner),
            check: backend.check_command().map(|c| c.to_string()),
            upgrade: backend.apply_command().to_string(),
        })
        .collect())
}

fn print_table(rows: &[BackendRow]) {
    println!(
        "{:<10} {:<10} {:<40}",
        style("BACKEND").bold(),
        style("STATUS").bold(),
        style("CHECK").bold()
    );
    println!("{}", "-".repeat(62));

    for row in rows {
        let status = match (row.enabled, row.installed) {
            (false, _) => style("disabled").dim(),
            (true, true) => style("installed").green(),
            (true, false) => style("missing").dim(),
        };
        let check = row
            .check
            .clone()
            .unwrap_or_else(|| "(no read-only check)".to_string());
        println!("{:<10} {:<10} {:<40}", row.name, status, check);
    }

    let active = rows.iter().filter(|r| r.enabled && r.installed).count();
    println!();
    println!("{} active backend(s)", active);
}
