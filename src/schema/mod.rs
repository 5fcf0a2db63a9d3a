pub mod derive;
pub mod infer;
pub mod types;

pub use derive::{derive_table, sanitize_column_name};
pub use infer::infer_column_type;
pub use types::{ColumnDescriptor, SqlType, TableDefinition};
