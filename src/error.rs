// src/error.rs
use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Where a file stopped on its way from disk to a committed table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Read,
    Create,
    Commit,
}

impl Stage {
    pub fn as_str(&self) -> &str {
        match self {
            Stage::Read => "read",
            Stage::Create => "create",
            Stage::Commit => "commit",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a file (or, for `Connection`, the whole run).
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The database could not be opened. Fatal for the run.
    #[error("cannot connect to database {path:?}: {source}")]
    Connection {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Source file missing or unreadable.
    #[error("cannot open {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content.
    #[error("malformed csv {path:?}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A declared date/time column named something the header does not have.
    #[error("date column `{column}` not present in {path:?}")]
    MissingDateColumn { path: PathBuf, column: String },

    /// A declared date/time column held a value no configured format accepts.
    #[error("column `{column}` row {row}: cannot parse `{value}` as a date/time")]
    DateParse {
        column: String,
        row: usize,
        value: String,
    },

    /// CREATE TABLE rejected by the database.
    #[error("create table `{table}` failed: {source}")]
    Create {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// The per-file transaction could not be opened or committed.
    #[error("transaction for `{table}` failed: {source}")]
    Commit {
        table: String,
        #[source]
        source: rusqlite::Error,
    },

    /// Anything else that went wrong while a file was in flight.
    #[error("unexpected error during {stage}: {message}")]
    Unexpected { stage: Stage, message: String },
}

impl MigrationError {
    /// Stage a file-scoped error belongs to. `None` for connection errors,
    /// which belong to the run rather than to any file.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            MigrationError::Connection { .. } => None,
            MigrationError::Io { .. }
            | MigrationError::Csv { .. }
            | MigrationError::MissingDateColumn { .. }
            | MigrationError::DateParse { .. } => Some(Stage::Read),
            MigrationError::Create { .. } => Some(Stage::Create),
            MigrationError::Commit { .. } => Some(Stage::Commit),
            MigrationError::Unexpected { stage, .. } => Some(*stage),
        }
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, MigrationError::Connection { .. })
    }
}

/// A single row that failed to insert. Logged and counted, never propagated.
#[derive(Error, Debug)]
#[error("row {row}: {source}")]
pub struct RowError {
    /// 1-based position of the row in the data section of the file.
    pub row: usize,
    #[source]
    pub source: rusqlite::Error,
}

pub type MigrationResult<T> = Result<T, MigrationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_errors_map_to_the_stage_they_stop_at() {
        let read = MigrationError::DateParse {
            column: "d".into(),
            row: 1,
            value: "x".into(),
        };
        assert_eq!(read.stage(), Some(Stage::Read));
        let create = MigrationError::Create {
            table: "t".into(),
            source: rusqlite::Error::InvalidQuery,
        };
        assert_eq!(create.stage(), Some(Stage::Create));
        assert_eq!(create.stage().map(|s| s.to_string()).as_deref(), Some("create"));
        let unexpected = MigrationError::Unexpected {
            stage: Stage::Commit,
            message: "gone".into(),
        };
        assert_eq!(unexpected.stage(), Some(Stage::Commit));
        assert!(!unexpected.is_fatal());
    }
}
