// src/process/mod.rs
use csv::ReaderBuilder;
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::{BufReader, Read},
    path::Path,
};
use tracing::{debug, warn};

use crate::config::CsvOptions;
use crate::error::{MigrationError, MigrationResult};

pub mod date_parser;
pub mod value;

pub use value::{Value, ValueKind};

/// One input file held in memory: header names plus parsed rows.
///
/// Short records are padded with nulls to the header width. A record wider
/// than the header survives reading and is rejected by the loader, so one
/// bad line costs one row rather than the whole file.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceDataset {
    /// Header names, trimmed, with repeats suffixed `.1`, `.2`, ...
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl SourceDataset {
    pub fn num_columns(&self) -> usize {
        self.headers.len()
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Values of column `idx` across rows that reach it.
    pub fn column(&self, idx: usize) -> impl Iterator<Item = &Value> + '_ {
        self.rows.iter().filter_map(move |r| r.get(idx))
    }

    pub fn null_count(&self, idx: usize) -> usize {
        self.column(idx).filter(|v| v.is_null()).count()
    }

    /// Rows with more cells than the header.
    pub fn overwide_rows(&self) -> usize {
        let width = self.num_columns();
        self.rows.iter().filter(|r| r.len() > width).count()
    }
}

/// Open `path` and read it as a headed CSV table.
#[tracing::instrument(level = "debug", skip(path, date_columns, opts), fields(path = %path.as_ref().display()))]
pub fn load_csv<P: AsRef<Path>>(
    path: P,
    date_columns: &[String],
    opts: &CsvOptions,
) -> MigrationResult<SourceDataset> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| MigrationError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_dataset(BufReader::new(file), path, date_columns, opts)
}

/// Parse a CSV stream into a `SourceDataset`.
///
/// Cells in `date_columns` must parse as date/times (or be null); the first
/// one that doesn't fails the whole read. Every other cell goes through
/// `Value::parse`.
pub fn read_dataset<R: Read>(
    reader: R,
    path: &Path,
    date_columns: &[String],
    opts: &CsvOptions,
) -> MigrationResult<SourceDataset> {
    let csv_err = |source: csv::Error| MigrationError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .delimiter(opts.delimiter as u8)
        .from_reader(reader);

    let headers = dedupe_headers(rdr.headers().map_err(csv_err)?.iter().map(str::trim));

    // map header index -> is declared date column
    let mut is_date = vec![false; headers.len()];
    for col in date_columns {
        match headers.iter().position(|h| h == col) {
            Some(idx) => is_date[idx] = true,
            None => {
                return Err(MigrationError::MissingDateColumn {
                    path: path.to_path_buf(),
                    column: col.clone(),
                })
            }
        }
    }

    let mut rows = Vec::new();
    for (idx, result) in rdr.records().enumerate() {
        let record = result.map_err(csv_err)?;
        let row_no = idx + 1;
        let mut row = Vec::with_capacity(record.len());
        for (col, raw) in record.iter().enumerate() {
            if is_date.get(col).copied().unwrap_or(false) {
                row.push(parse_date_cell(raw, &headers[col], row_no, opts)?);
            } else {
                row.push(Value::parse(raw, &opts.null_markers));
            }
        }
        // missing trailing fields are nulls
        if row.len() < headers.len() {
            row.resize(headers.len(), Value::Null);
        }
        rows.push(row);
    }

    let dataset = SourceDataset { headers, rows };
    let overwide = dataset.overwide_rows();
    if overwide > 0 {
        warn!(
            overwide,
            width = dataset.num_columns(),
            "some records have more cells than the header"
        );
    }
    debug!(
        rows = dataset.num_rows(),
        columns = dataset.num_columns(),
        "dataset read"
    );
    Ok(dataset)
}

/// Rename repeated header names `name.1`, `name.2`, ... skipping any
/// suffix that is already taken, so every column has a distinct name.
fn dedupe_headers<'a, I>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let raw: Vec<&str> = raw.into_iter().collect();
    let mut taken: HashSet<String> = raw.iter().map(|s| s.to_string()).collect();
    let mut seen: HashMap<&str, usize> = HashMap::new();
    let mut out = Vec::with_capacity(raw.len());

    for name in raw {
        let count = seen.entry(name).or_insert(0);
        if *count == 0 {
            *count = 1;
            out.push(name.to_string());
            continue;
        }
        let mut candidate = format!("{}.{}", name, count);
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{}.{}", name, count);
        }
        *count += 1;
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

fn parse_date_cell(
    raw: &str,
    column: &str,
    row: usize,
    opts: &CsvOptions,
) -> MigrationResult<Value> {
    let cell = value::clean_str(raw);
    if value::is_null(cell, &opts.null_markers) {
        return Ok(Value::Null);
    }
    date_parser::parse_datetime(cell, &opts.date_formats)
        .map(Value::DateTime)
        .ok_or_else(|| MigrationError::DateParse {
            column: column.to_string(),
            row,
            value: cell.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use std::io::{Cursor, Write};
    use tempfile::NamedTempFile;

    fn read(content: &str, dates: &[&str]) -> MigrationResult<SourceDataset> {
        let dates: Vec<String> = dates.iter().map(|s| s.to_string()).collect();
        read_dataset(
            Cursor::new(content.as_bytes().to_vec()),
            Path::new("test.csv"),
            &dates,
            &CsvOptions::default(),
        )
    }

    #[test]
    fn reads_header_and_typed_rows() -> Result<()> {
        let ds = read("id,name,price,active\n1,Widget,2.50,True\n2, Gadget ,,False\n", &[])?;
        assert_eq!(ds.headers, vec!["id", "name", "price", "active"]);
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(
            ds.rows[1],
            vec![
                Value::Integer(2),
                Value::Text("Gadget".into()),
                Value::Null,
                Value::Bool(false),
            ]
        );
        assert_eq!(ds.null_count(2), 1);
        Ok(())
    }

    #[test]
    fn parses_declared_date_columns() -> Result<()> {
        let ds = read("sale_date,amount\n2024-01-05,19.99\n,5.00\n", &["sale_date"])?;
        assert!(matches!(ds.rows[0][0], Value::DateTime(_)));
        assert_eq!(ds.rows[1][0], Value::Null);
        Ok(())
    }

    #[test]
    fn bad_date_fails_whole_read() {
        let err = read(
            "sale_date,amount\n2024-01-05,19.99\nnot-a-date,5.00\n",
            &["sale_date"],
        )
        .unwrap_err();
        match err {
            MigrationError::DateParse { column, row, value } => {
                assert_eq!(column, "sale_date");
                assert_eq!(row, 2);
                assert_eq!(value, "not-a-date");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn undeclared_date_text_stays_text() -> Result<()> {
        let ds = read("d\n2024-01-05\n", &[])?;
        assert_eq!(ds.rows[0][0], Value::Text("2024-01-05".into()));
        Ok(())
    }

    #[test]
    fn missing_date_column_is_an_error() {
        let err = read("a,b\n1,2\n", &["when"]).unwrap_err();
        assert!(matches!(err, MigrationError::MissingDateColumn { .. }));
    }

    #[test]
    fn keeps_overwide_records() -> Result<()> {
        let ds = read("a,b,c\n1,2,3\n4,5,6,7\n", &[])?;
        assert_eq!(ds.num_rows(), 2);
        assert_eq!(ds.rows[1].len(), 4);
        assert_eq!(ds.overwide_rows(), 1);
        Ok(())
    }

    #[test]
    fn pads_short_records_with_nulls() -> Result<()> {
        let ds = read("id,name,price\n1,a,2.5\n2,b\n", &[])?;
        assert_eq!(
            ds.rows[1],
            vec![Value::Integer(2), Value::Text("b".into()), Value::Null]
        );
        assert_eq!(ds.overwide_rows(), 0);
        assert_eq!(ds.null_count(2), 1);
        Ok(())
    }

    #[test]
    fn renames_repeated_headers() -> Result<()> {
        let ds = read("a,a,b,a\n1,2,3,4\n", &[])?;
        assert_eq!(ds.headers, vec!["a", "a.1", "b", "a.2"]);
        // an existing `a.1` header pushes the repeat to `a.2`
        let ds = read("a,a.1,a\n1,2,3\n", &[])?;
        assert_eq!(ds.headers, vec!["a", "a.1", "a.2"]);
        Ok(())
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_csv("no/such/file.csv", &[], &CsvOptions::default()).unwrap_err();
        assert!(matches!(err, MigrationError::Io { .. }));
    }

    #[test]
    fn loads_from_disk_with_custom_delimiter() -> Result<()> {
        let mut f = NamedTempFile::new()?;
        write!(f, "x;y\n1;hello\n")?;
        let opts = CsvOptions {
            delimiter: ';',
            ..CsvOptions::default()
        };
        let ds = load_csv(f.path(), &[], &opts)?;
        assert_eq!(ds.rows[0], vec![Value::Integer(1), Value::Text("hello".into())]);
        Ok(())
    }
}
