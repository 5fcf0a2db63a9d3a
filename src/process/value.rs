use chrono::NaiveDateTime;
use rusqlite::types::{ToSql, ToSqlOutput, Value as SqlValue};

/// Storage format for date/time values bound into the database.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One parsed CSV cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(i64),
    Float(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Text(String),
    Null,
}

/// The shape of a value, ignoring its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Integer,
    Float,
    Bool,
    DateTime,
    Text,
    Null,
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Integer(_) => ValueKind::Integer,
            Value::Float(_) => ValueKind::Float,
            Value::Bool(_) => ValueKind::Bool,
            Value::DateTime(_) => ValueKind::DateTime,
            Value::Text(_) => ValueKind::Text,
            Value::Null => ValueKind::Null,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Infer a value from a cell that is not a declared date/time column.
    /// Integer wins over float, float over bool, anything else is text.
    pub fn parse(raw: &str, null_markers: &[String]) -> Value {
        let cell = clean_str(raw);
        if is_null(cell, null_markers) {
            return Value::Null;
        }
        if let Ok(i) = cell.parse::<i64>() {
            return Value::Integer(i);
        }
        if let Some(f) = parse_float(cell) {
            return Value::Float(f);
        }
        if let Some(b) = parse_bool(cell) {
            return Value::Bool(b);
        }
        Value::Text(cell.to_string())
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            Value::Integer(i) => ToSqlOutput::Owned(SqlValue::Integer(*i)),
            Value::Float(x) => ToSqlOutput::Owned(SqlValue::Real(*x)),
            Value::Bool(b) => ToSqlOutput::Owned(SqlValue::Integer(i64::from(*b))),
            Value::DateTime(dt) => {
                ToSqlOutput::Owned(SqlValue::Text(dt.format(DATETIME_FORMAT).to_string()))
            }
            Value::Text(s) => ToSqlOutput::from(s.as_str()),
            Value::Null => ToSqlOutput::Owned(SqlValue::Null),
        })
    }
}

/// Trim whitespace around a raw cell.
pub fn clean_str(raw: &str) -> &str {
    raw.trim()
}

pub fn is_null(cell: &str, null_markers: &[String]) -> bool {
    cell.is_empty() || null_markers.iter().any(|m| m == cell)
}

/// Finite decimals and exponents only; "inf"/"nan" spellings stay text.
fn parse_float(cell: &str) -> Option<f64> {
    let looks_numeric = cell
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'))
        && cell.chars().any(|c| c.is_ascii_digit());
    if !looks_numeric {
        return None;
    }
    cell.parse::<f64>().ok().filter(|f| f.is_finite())
}

fn parse_bool(cell: &str) -> Option<bool> {
    match cell {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
