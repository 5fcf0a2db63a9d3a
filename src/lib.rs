pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod migrate;
pub mod process;
pub mod schema;

pub use config::{MigrationConfig, SourceFile};
pub use error::{MigrationError, Stage};
pub use migrate::{run_migration, FileOutcome, LoadReport, MigrationSummary, Migrator};
