use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Instant;
use tracing::info;

use crate::error::{MigrationError, MigrationResult};
use crate::schema::TableDefinition;

pub mod loader;

pub use loader::{insert_rows, InsertOutcome};

/// Open a SQLite database on disk at `path`, creating the file if allowed.
pub fn open_disk_db(path: &Path, create_if_missing: bool) -> MigrationResult<Connection> {
    let mut flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_URI
        | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    if create_if_missing {
        flags |= OpenFlags::SQLITE_OPEN_CREATE;
    }
    Connection::open_with_flags(path, flags).map_err(|source| MigrationError::Connection {
        path: path.to_path_buf(),
        source,
    })
}

/// Open an in-memory database.
pub fn open_mem_db() -> MigrationResult<Connection> {
    Connection::open_in_memory().map_err(|source| MigrationError::Connection {
        path: ":memory:".into(),
        source,
    })
}

/// Double-quote an identifier, doubling any embedded quote.
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub fn create_table_sql(def: &TableDefinition) -> String {
    let cols = def
        .columns
        .iter()
        .map(|c| format!("{} {}", quote_ident(&c.name), c.ty.as_sql()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        quote_ident(&def.table),
        cols
    )
}

/// Column list and placeholders follow `def.columns` order.
pub fn insert_sql(def: &TableDefinition) -> String {
    let cols = def
        .column_names()
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; def.len()].join(", ");
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        quote_ident(&def.table),
        cols,
        placeholders
    )
}

/// Issue CREATE TABLE IF NOT EXISTS for `def`. An existing table is left as
/// is, even if its columns differ.
pub fn create_table(conn: &Connection, def: &TableDefinition) -> MigrationResult<()> {
    let sql = create_table_sql(def);
    info!("Executing CREATE TABLE query: {}", sql);
    let start = Instant::now();
    conn.execute(&sql, [])
        .map_err(|source| MigrationError::Create {
            table: def.table.clone(),
            source,
        })?;
    info!(
        "Table creation time: {:.2} seconds",
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ColumnDescriptor, SqlType};
    use anyhow::Result;

    fn def() -> TableDefinition {
        TableDefinition {
            table: "order".into(),
            columns: vec![
                ColumnDescriptor {
                    name: "id".into(),
                    ty: SqlType::Integer,
                },
                ColumnDescriptor {
                    name: "odd\"name".into(),
                    ty: SqlType::Text,
                },
            ],
        }
    }

    #[test]
    fn quotes_identifiers() {
        assert_eq!(quote_ident("select"), "\"select\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn renders_statements_in_column_order() {
        assert_eq!(
            create_table_sql(&def()),
            r#"CREATE TABLE IF NOT EXISTS "order" ("id" INTEGER, "odd""name" TEXT)"#
        );
        assert_eq!(
            insert_sql(&def()),
            r#"INSERT INTO "order" ("id", "odd""name") VALUES (?, ?)"#
        );
    }

    #[test]
    fn create_is_idempotent() -> Result<()> {
        let conn = open_mem_db()?;
        create_table(&conn, &def())?;
        create_table(&conn, &def())?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'order'",
            [],
            |r| r.get(0),
        )?;
        assert_eq!(n, 1);
        Ok(())
    }

    #[test]
    fn rejected_create_is_create_error() -> Result<()> {
        let conn = open_mem_db()?;
        let bad = TableDefinition {
            table: "empty".into(),
            columns: vec![],
        };
        let err = create_table(&conn, &bad).unwrap_err();
        assert!(matches!(err, MigrationError::Create { .. }));
        Ok(())
    }

    #[test]
    fn connection_error_when_not_allowed_to_create() {
        let tmp = tempfile::TempDir::new().unwrap();
        let err = open_disk_db(&tmp.path().join("missing.db"), false).unwrap_err();
        assert!(err.is_fatal());
    }
}
