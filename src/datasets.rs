//! Dataset store
//!
//! Loads the read-only CSV artifacts produced by the upstream pipeline and
//! enforces the declared schema. A missing file is `DatasetUnavailable`; a
//! missing column is `SchemaMismatch`.

use crate::catalog::DatasetKind;
use crate::config::DatasetFiles;
use crate::error::{QaError, Result};
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct DatasetStore {
    data_dir: PathBuf,
    files: DatasetFiles,
}

impl DatasetStore {
    pub fn new(data_dir: impl Into<PathBuf>, files: DatasetFiles) -> Self {
        Self {
            data_dir: data_dir.into(),
            files,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn path(&self, kind: DatasetKind) -> PathBuf {
        self.data_dir.join(kind.file_name(&self.files))
    }

    /// Load a dataset without column checks.
    pub fn load(&self, kind: DatasetKind) -> Result<DataFrame> {
        let path = self.path(kind);
        if !path.is_file() {
            return Err(QaError::DatasetUnavailable {
                dataset: kind.to_string(),
                path: path.display().to_string(),
            });
        }

        let df = LazyCsvReader::new(&path)
            .with_infer_schema_length(Some(1000))
            .finish()?
            .collect()?;
        debug!("Loaded {} ({} rows) from {}", kind, df.height(), path.display());
        Ok(df)
    }

    /// Load a dataset and require that every column in `columns` exists.
    pub fn load_with_columns(&self, kind: DatasetKind, columns: &[&str]) -> Result<DataFrame> {
        let df = self.load(kind)?;
        require_columns(&df, kind, columns)?;
        Ok(df)
    }
}

pub fn require_columns(df: &DataFrame, kind: DatasetKind, columns: &[&str]) -> Result<()> {
    let available = df.get_column_names();
    for column in columns {
        if !available.contains(column) {
            return Err(QaError::SchemaMismatch {
                dataset: kind.to_string(),
                column: column.to_string(),
                available: available.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    Ok(())
}

/// Column values as strings; nulls become empty strings.
pub fn string_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let series = df.column(column)?.cast(&DataType::String)?;
    let values = series
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or("").to_string())
        .collect();
    Ok(values)
}

/// Column values as f64; nulls count as zero.
pub fn float_values(df: &DataFrame, column: &str) -> Result<Vec<f64>> {
    let series = df.column(column)?.cast(&DataType::Float64)?;
    let values = series.f64()?.into_iter().map(|v| v.unwrap_or(0.0)).collect();
    Ok(values)
}

/// Sum of a numeric column; zero for an empty frame.
pub fn column_sum(df: &DataFrame, column: &str) -> Result<f64> {
    Ok(float_values(df, column)?.iter().sum())
}

/// Rows whose `column` equals `value` (compared as strings).
pub fn filter_equals(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame> {
    let filtered = df
        .clone()
        .lazy()
        .filter(col(column).cast(DataType::String).eq(lit(value)))
        .collect()?;
    Ok(filtered)
}

/// Sum `value_column` per distinct `key_column`, keeping first-appearance order.
pub fn sum_by(df: &DataFrame, key_column: &str, value_column: &str) -> Result<Vec<(String, f64)>> {
    let grouped = df
        .clone()
        .lazy()
        .group_by_stable([col(key_column)])
        .agg([col(value_column).cast(DataType::Float64).sum()])
        .collect()?;
    let keys = string_values(&grouped, key_column)?;
    let values = float_values(&grouped, value_column)?;
    Ok(keys.into_iter().zip(values).collect())
}

/// Distinct values of `column` in first-appearance order, nulls and blanks skipped.
pub fn distinct_values(df: &DataFrame, column: &str) -> Result<Vec<String>> {
    let mut seen = std::collections::HashSet::new();
    let values = string_values(df, column)?
        .into_iter()
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(v.clone()))
        .collect();
    Ok(values)
}

/// Persist a frame as CSV (header included).
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file).finish(&mut df)?;
    Ok(())
}
