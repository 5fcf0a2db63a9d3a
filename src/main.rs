use anyhow::{Context, Result};
use csv2sql::{config::MigrationConfig, logging, migrate::run_migration, FileOutcome};
use std::env;
use tracing::{error, info, warn};

fn main() -> Result<()> {
    // ─── 1) load config ──────────────────────────────────────────────
    let config_path = env::args()
        .nth(1)
        .unwrap_or_else(|| "migration.yaml".to_string());
    let config = MigrationConfig::load(&config_path)?;

    // ─── 2) init logging ─────────────────────────────────────────────
    logging::init(&config.log).context("initialising logging")?;
    info!(config = %config_path, files = config.files.len(), "startup");

    // ─── 3) migrate ──────────────────────────────────────────────────
    // per-file and connection failures are already logged; exit status stays 0
    let summary = match run_migration(&config) {
        Ok(summary) => summary,
        Err(_) => return Ok(()),
    };

    // ─── 4) summary ──────────────────────────────────────────────────
    for outcome in &summary.outcomes {
        match outcome {
            FileOutcome::Loaded(r) if r.rows_failed() > 0 => warn!(
                "{} -> {}: {}/{} rows inserted, failed rows {:?}",
                r.file,
                r.table,
                r.rows_inserted,
                r.rows_attempted,
                r.failed_rows
            ),
            FileOutcome::Loaded(r) => info!(
                "{} -> {}: {} rows inserted",
                r.file, r.table, r.rows_inserted
            ),
            FileOutcome::Failed {
                file, table, stage, ..
            } => error!("{} -> {}: abandoned at {}", file, table, stage),
        }
    }
    info!(
        loaded = summary.loaded(),
        failed = summary.failed(),
        rows = summary.rows_inserted(),
        "all done"
    );
    Ok(())
}
