use super::SqlType;
use crate::process::{Value, ValueKind};

/// Map a column's values to one SQL type.
///
/// Nulls are ignored. Precedence: all integers -> INTEGER, integers and
/// floats -> FLOAT, all booleans -> BOOLEAN, all date/times -> DATETIME,
/// anything else (including a column with no non-null values) -> TEXT.
pub fn infer_column_type<'a, I>(values: I) -> SqlType
where
    I: IntoIterator<Item = &'a Value>,
{
    let mut integer = false;
    let mut float = false;
    let mut boolean = false;
    let mut datetime = false;
    let mut text = false;

    for v in values {
        match v.kind() {
            ValueKind::Integer => integer = true,
            ValueKind::Float => float = true,
            ValueKind::Bool => boolean = true,
            ValueKind::DateTime => datetime = true,
            ValueKind::Text => text = true,
            ValueKind::Null => {}
        }
    }

    let numeric = integer || float;
    let others = boolean || datetime || text;
    if integer && !float && !others {
        SqlType::Integer
    } else if numeric && !others {
        SqlType::Float
    } else if boolean && !numeric && !datetime && !text {
        SqlType::Boolean
    } else if datetime && !numeric && !boolean && !text {
        SqlType::DateTime
    } else {
        SqlType::Text
    }
}
