use tracing::warn;

use super::{infer::infer_column_type, ColumnDescriptor, TableDefinition};
use crate::process::SourceDataset;

/// Replace spaces, hyphens and periods with underscores.
pub fn sanitize_column_name(raw: &str) -> String {
    raw.chars()
        .map(|c| match c {
            ' ' | '-' | '.' => '_',
            other => other,
        })
        .collect()
}

/// Build the table definition for `dataset`: one descriptor per header, in
/// header order, named by `sanitize_column_name` and typed by
/// `infer_column_type` over that column's values.
pub fn derive_table(table: &str, dataset: &SourceDataset) -> TableDefinition {
    if dataset.rows.iter().any(|r| r.len() > dataset.num_columns()) {
        warn!(
            "derive_table: some rows in `{}` have more cells than headers ({} headers)",
            table,
            dataset.num_columns()
        );
    }

    let columns = dataset
        .headers
        .iter()
        .enumerate()
        .map(|(idx, raw_name)| {
            let name = sanitize_column_name(raw_name);
            let ty = infer_column_type(dataset.column(idx));
            ColumnDescriptor { name, ty }
        })
        .collect();

    TableDefinition {
        table: table.to_string(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::Value;
    use crate::schema::SqlType;

    #[test]
    fn sanitizes_separators() {
        assert_eq!(sanitize_column_name("a b-c.d"), "a_b_c_d");
        assert_eq!(sanitize_column_name("Unit Price (USD)"), "Unit_Price_(USD)");
    }

    #[test]
    fn sanitizing_is_idempotent() {
        for raw in ["a b-c.d", "plain", "x..y  z--", ""] {
            let once = sanitize_column_name(raw);
            assert_eq!(sanitize_column_name(&once), once);
        }
    }

    #[test]
    fn derives_ordered_typed_columns() {
        let ds = SourceDataset {
            headers: vec!["Product ID".into(), "unit.price".into(), "in-stock".into()],
            rows: vec![
                vec![Value::Integer(1), Value::Float(2.5), Value::Bool(true)],
                vec![Value::Integer(2), Value::Integer(3), Value::Null],
            ],
        };
        let def = derive_table("products", &ds);
        assert_eq!(def.table, "products");
        assert_eq!(
            def.columns,
            vec![
                ColumnDescriptor {
                    name: "Product_ID".into(),
                    ty: SqlType::Integer
                },
                ColumnDescriptor {
                    name: "unit_price".into(),
                    ty: SqlType::Float
                },
                ColumnDescriptor {
                    name: "in_stock".into(),
                    ty: SqlType::Boolean
                },
            ]
        );
    }

    #[test]
    fn extra_cells_do_not_affect_inference() {
        let ds = SourceDataset {
            headers: vec!["a".into()],
            rows: vec![
                vec![Value::Integer(1)],
                vec![Value::Integer(2), Value::Text("extra".into())],
            ],
        };
        let def = derive_table("t", &ds);
        assert_eq!(def.len(), 1);
        assert_eq!(def.columns[0].ty, SqlType::Integer);
    }
}
