use rusqlite::{params_from_iter, Connection};
use std::time::Instant;
use tracing::{debug, error, info};

use super::insert_sql;
use crate::error::RowError;
use crate::process::Value;
use crate::schema::TableDefinition;

/// Tally of one insert pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertOutcome {
    pub attempted: usize,
    pub inserted: usize,
    /// 1-based indices of rows that failed.
    pub failed_rows: Vec<usize>,
}

impl InsertOutcome {
    pub fn failed(&self) -> usize {
        self.failed_rows.len()
    }
}

/// Insert `rows` into `def.table` in order, one parameterized statement per
/// row. Nulls bind as SQL NULL. A row that fails is logged with its 1-based
/// index and skipped; the loop always runs to the end.
///
/// Rows are staged on `conn`; when that is a transaction, nothing is durable
/// until the caller commits.
pub fn insert_rows(conn: &Connection, def: &TableDefinition, rows: &[Vec<Value>]) -> InsertOutcome {
    let sql = insert_sql(def);
    debug!("insert statement: {}", sql);

    let start = Instant::now();
    let mut outcome = InsertOutcome::default();

    for (idx, row) in rows.iter().enumerate() {
        let row_no = idx + 1;
        outcome.attempted += 1;
        match insert_row(conn, &sql, row) {
            Ok(()) => outcome.inserted += 1,
            Err(source) => {
                let err = RowError {
                    row: row_no,
                    source,
                };
                error!("Error inserting into {}: {}", def.table, err);
                outcome.failed_rows.push(row_no);
            }
        }
    }

    info!(
        "Inserted {} rows into {} in {:.2} seconds",
        outcome.inserted,
        def.table,
        start.elapsed().as_secs_f64()
    );
    outcome
}

// prepare_cached makes the per-row prepare a cache hit once it succeeds
fn insert_row(conn: &Connection, sql: &str, row: &[Value]) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare_cached(sql)?;
    stmt.execute(params_from_iter(row.iter()))?;
    Ok(())
}
