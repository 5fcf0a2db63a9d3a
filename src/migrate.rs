// src/migrate.rs
use rusqlite::Connection;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};

use crate::config::{MigrationConfig, SourceFile};
use crate::db::{create_table, insert_rows, open_disk_db};
use crate::error::{MigrationError, MigrationResult, Stage};
use crate::process::{load_csv, SourceDataset};
use crate::schema::{derive_table, TableDefinition};

/// Counts and phase timings for one committed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    pub file: String,
    pub table: String,
    pub rows_attempted: usize,
    pub rows_inserted: usize,
    /// 1-based indices of rows that failed to insert.
    pub failed_rows: Vec<usize>,
    pub read: Duration,
    pub create: Duration,
    pub insert: Duration,
    pub total: Duration,
}

impl LoadReport {
    pub fn rows_failed(&self) -> usize {
        self.rows_attempted - self.rows_inserted
    }
}

/// How a configured (file, table) pair ended.
#[derive(Debug)]
pub enum FileOutcome {
    Loaded(LoadReport),
    Failed {
        file: String,
        table: String,
        stage: Stage,
        error: MigrationError,
    },
}

impl FileOutcome {
    pub fn file(&self) -> &str {
        match self {
            FileOutcome::Loaded(r) => &r.file,
            FileOutcome::Failed { file, .. } => file,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, FileOutcome::Loaded(_))
    }

    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            FileOutcome::Loaded(r) => Some(r),
            FileOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug)]
pub struct MigrationSummary {
    /// One entry per configured pair, in configured order.
    pub outcomes: Vec<FileOutcome>,
    pub elapsed: Duration,
}

impl MigrationSummary {
    pub fn loaded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_loaded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.loaded()
    }

    pub fn rows_inserted(&self) -> usize {
        self.outcomes
            .iter()
            .filter_map(FileOutcome::report)
            .map(|r| r.rows_inserted)
            .sum()
    }

    pub fn outcome(&self, file: &str) -> Option<&FileOutcome> {
        self.outcomes.iter().find(|o| o.file() == file)
    }
}

/// Runs the configured pairs one after another over a single connection.
pub struct Migrator {
    config: MigrationConfig,
    conn: Connection,
}

impl Migrator {
    /// Open the configured database. Failure here ends the run before any
    /// file is touched.
    pub fn connect(config: MigrationConfig) -> MigrationResult<Self> {
        let conn = open_disk_db(&config.database.path, config.database.create_if_missing)?;
        info!(
            "Successfully connected to database {}",
            config.database.path.display()
        );
        Ok(Self { config, conn })
    }

    /// Wrap an already open connection.
    pub fn with_connection(config: MigrationConfig, conn: Connection) -> Self {
        Self { config, conn }
    }

    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Process every configured pair in order. A failed file is logged and
    /// skipped; it never stops the files after it.
    pub fn run(&mut self) -> MigrationSummary {
        let start = Instant::now();
        let mut outcomes = Vec::with_capacity(self.config.files.len());

        for entry in &self.config.files {
            let outcome = match process_file(&mut self.conn, &self.config, entry) {
                Ok(report) => FileOutcome::Loaded(report),
                Err(err) => {
                    let stage = err.stage().unwrap_or(Stage::Read);
                    log_failure(entry, &err);
                    FileOutcome::Failed {
                        file: entry.file.clone(),
                        table: entry.table.clone(),
                        stage,
                        error: err,
                    }
                }
            };
            outcomes.push(outcome);
        }

        MigrationSummary {
            outcomes,
            elapsed: start.elapsed(),
        }
    }

    /// Close the connection, logging whether it went cleanly.
    pub fn close(self) {
        match self.conn.close() {
            Ok(()) => info!("Database connection closed"),
            Err((_conn, err)) => error!("Error closing database connection: {}", err),
        }
    }
}

fn log_failure(entry: &SourceFile, err: &MigrationError) {
    match err {
        MigrationError::Io { .. }
        | MigrationError::Csv { .. }
        | MigrationError::MissingDateColumn { .. }
        | MigrationError::DateParse { .. } => {
            error!("Error reading CSV file {}: {}", entry.file, err)
        }
        MigrationError::Create { .. } | MigrationError::Commit { .. } => {
            error!("Database error for {}: {}", entry.file, err)
        }
        _ => error!("Unexpected error processing {}: {}", entry.file, err),
    }
}

/// READ -> SCHEMA -> CREATE -> INSERT -> COMMIT for one pair. The dataset is
/// dropped when this returns; an error before commit rolls the transaction
/// back with it.
#[instrument(level = "info", skip_all, fields(file = %entry.file, table = %entry.table))]
fn process_file(
    conn: &mut Connection,
    config: &MigrationConfig,
    entry: &SourceFile,
) -> MigrationResult<LoadReport> {
    info!("Processing {} for table {}", entry.file, entry.table);
    let file_start = Instant::now();

    // ─── read ─────────────────────────────────────────────────────────
    let path = config.file_path(entry);
    info!("Reading CSV file: {}", path.display());
    let t = Instant::now();
    let dataset = load_csv(&path, &entry.date_columns, &config.csv)?;
    let read = t.elapsed();
    info!("CSV read time: {:.2} seconds", read.as_secs_f64());

    // ─── schema ───────────────────────────────────────────────────────
    let def = derive_table(&entry.table, &dataset);
    log_columns(&def, &dataset);

    // ─── create ───────────────────────────────────────────────────────
    let tx = conn
        .transaction()
        .map_err(|e| MigrationError::Unexpected {
            stage: Stage::Create,
            message: format!("cannot begin transaction: {}", e),
        })?;
    let t = Instant::now();
    create_table(&tx, &def)?;
    let create = t.elapsed();

    // ─── insert ───────────────────────────────────────────────────────
    let t = Instant::now();
    let outcome = insert_rows(&tx, &def, &dataset.rows);
    let insert = t.elapsed();

    // ─── commit ───────────────────────────────────────────────────────
    tx.commit().map_err(|source| MigrationError::Commit {
        table: entry.table.clone(),
        source,
    })?;
    info!("Committed transaction for {}", entry.table);

    let total = file_start.elapsed();
    info!(
        "Total processing time for {}: {:.2} seconds",
        entry.file,
        total.as_secs_f64()
    );

    Ok(LoadReport {
        file: entry.file.clone(),
        table: entry.table.clone(),
        rows_attempted: outcome.attempted,
        rows_inserted: outcome.inserted,
        failed_rows: outcome.failed_rows,
        read,
        create,
        insert,
        total,
    })
}

fn log_columns(def: &TableDefinition, dataset: &SourceDataset) {
    let types = def
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.ty))
        .collect::<Vec<_>>()
        .join(", ");
    info!("Column types: {}", types);

    let nulls = def
        .columns
        .iter()
        .enumerate()
        .map(|(idx, c)| format!("{}={}", c.name, dataset.null_count(idx)))
        .collect::<Vec<_>>()
        .join(", ");
    info!("Null values: {}", nulls);
}

/// Connect, run every configured pair, close. Only a connection failure is
/// returned as an error; per-file failures are inside the summary.
pub fn run_migration(config: &MigrationConfig) -> MigrationResult<MigrationSummary> {
    let start = Instant::now();
    info!("Starting CSV to SQL migration process");

    let result = match Migrator::connect(config.clone()) {
        Ok(mut migrator) => {
            let summary = migrator.run();
            migrator.close();
            Ok(summary)
        }
        Err(err) => {
            error!("Error connecting to database: {}", err);
            Err(err)
        }
    };

    info!(
        "Total execution time: {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
    info!("CSV to SQL migration process completed");
    result
}
