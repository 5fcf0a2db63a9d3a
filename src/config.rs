// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

/// Overrides `database.path` when set.
pub const DATABASE_ENV: &str = "CSV2SQL_DATABASE";

/// Everything one migration run needs. Loaded once, handed to the `Migrator`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MigrationConfig {
    /// Folder the CSV files are read from.
    pub source_dir: PathBuf,
    pub database: DatabaseConfig,
    /// Processed strictly in this order.
    pub files: Vec<SourceFile>,
    #[serde(default)]
    pub csv: CsvOptions,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    #[serde(default = "default_true")]
    pub create_if_missing: bool,
}

/// One (file, table) pair plus the columns of that file to read as date/times.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceFile {
    pub file: String,
    pub table: String,
    #[serde(default)]
    pub date_columns: Vec<String>,
}

impl SourceFile {
    pub fn new(file: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            table: table.into(),
            date_columns: Vec::new(),
        }
    }

    pub fn with_date_columns<I, S>(mut self, cols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.date_columns = cols.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CsvOptions {
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
    /// Cell contents (after trimming) treated as missing. Empty cells always are.
    #[serde(default = "default_null_markers")]
    pub null_markers: Vec<String>,
    /// chrono formats tried in order for declared date/time columns.
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: default_delimiter(),
            null_markers: default_null_markers(),
            date_formats: default_date_formats(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LogConfig {
    /// Persistent log, appended to. `None` logs to the console only.
    #[serde(default = "default_log_file")]
    pub file: Option<PathBuf>,
    /// EnvFilter directive; RUST_LOG wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            filter: default_filter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_delimiter() -> char {
    ','
}

fn default_null_markers() -> Vec<String> {
    [
        "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
        "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_date_formats() -> Vec<String> {
    [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%d",
        "%Y/%m/%d",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_log_file() -> Option<PathBuf> {
    Some(PathBuf::from("csv_to_sql.log"))
}

fn default_filter() -> String {
    "info".to_string()
}

impl MigrationConfig {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        database: impl Into<PathBuf>,
        files: Vec<SourceFile>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            database: DatabaseConfig {
                path: database.into(),
                create_if_missing: true,
            },
            files,
            csv: CsvOptions::default(),
            log: LogConfig::default(),
        }
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let cfg: MigrationConfig =
            serde_yaml::from_str(yaml).context("parsing migration config")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a YAML config, then apply the env override.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut cfg = Self::from_yaml_str(&text)
            .with_context(|| format!("loading config {}", path.display()))?;
        if let Ok(db) = env::var(DATABASE_ENV) {
            if !db.trim().is_empty() {
                cfg.database.path = PathBuf::from(db);
            }
        }
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.files.is_empty() {
            bail!("config lists no files to migrate");
        }
        if !self.csv.delimiter.is_ascii() {
            bail!(
                "delimiter {:?} must be a single-byte character",
                self.csv.delimiter
            );
        }
        if self.csv.date_formats.is_empty() {
            bail!("csv.date_formats must not be empty");
        }
        for (idx, entry) in self.files.iter().enumerate() {
            if entry.file.trim().is_empty() {
                bail!("files[{}]: file name is empty", idx);
            }
            if entry.table.trim().is_empty() {
                bail!("files[{}] ({}): table name is empty", idx, entry.file);
            }
            let mut seen = HashSet::new();
            for col in &entry.date_columns {
                if !seen.insert(col.as_str()) {
                    return Err(anyhow!(
                        "files[{}] ({}): date column `{}` listed twice",
                        idx,
                        entry.file,
                        col
                    ));
                }
            }
        }
        Ok(())
    }

    pub fn file_path(&self, entry: &SourceFile) -> PathBuf {
        self.source_dir.join(&entry.file)
    }
}
