//! Execution Logging
//!
//! One structured record per query, appended to a CSV file. The header row is
//! written once, when the file is first created. Appends go through a single
//! mutex so concurrent callers cannot interleave records.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Execution log entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub query_id: String,
    pub timestamp: String,
    pub query: String,
    /// Empty when the query was unresolved
    pub category: String,
    /// "success", "fallback", or the error text
    pub status: String,
    pub rows: usize,
    pub plot: bool,
    pub match_stage: String,
    pub elapsed_ms: u64,
}

/// Append-only execution logger
pub struct ExecutionLogger {
    path: PathBuf,
    /// Whether the file already carries its header row
    header_written: Mutex<bool>,
}

impl ExecutionLogger {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let header_written = fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false);
        debug!(
            "Execution log at {} (existing: {})",
            path.display(),
            header_written
        );

        Ok(Self {
            path,
            header_written: Mutex::new(header_written),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut header_written = self.header_written.lock().unwrap_or_else(|e| e.into_inner());

        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(!*header_written)
            .from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;

        *header_written = true;
        Ok(())
    }

    /// Every record in a log file, including those from earlier sessions.
    pub fn read_all(path: &Path) -> Result<Vec<LogRecord>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for record in reader.deserialize() {
            records.push(record?);
        }
        Ok(records)
    }
}
