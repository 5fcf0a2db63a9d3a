// src/schema/types.rs

use std::fmt;

/// The five column types a CSV column can be mapped to.
#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum SqlType {
    Integer,
    Float,
    Boolean,
    DateTime,
    Text,
}

impl SqlType {
    /// Type name used in CREATE TABLE.
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Float => "REAL",
            SqlType::Boolean => "BOOLEAN",
            SqlType::DateTime => "DATETIME",
            SqlType::Text => "TEXT",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SqlType::Integer => "INTEGER",
            SqlType::Float => "FLOAT",
            SqlType::Boolean => "BOOLEAN",
            SqlType::DateTime => "DATETIME",
            SqlType::Text => "TEXT",
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sanitized column name and the type inferred for it.
#[derive(Debug, PartialEq, Clone, Eq, Hash)]
pub struct ColumnDescriptor {
    pub name: String,
    pub ty: SqlType,
}

/// Target table name plus its columns, in file order.
#[derive(Debug, PartialEq, Clone, Eq)]
pub struct TableDefinition {
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
}

impl TableDefinition {
    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
