//! Application configuration
//!
//! Defaults, overlaid by an optional JSON file, then by environment variables
//! (a `.env` file is honoured by the binary via `dotenv`). CLI flags are applied
//! last in `main`.

use crate::error::{QaError, Result};
use crate::intent::classifier::SynonymMatching;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const ENV_DATA_DIR: &str = "RETAIL_QA_DATA_DIR";
pub const ENV_OUTPUT_DIR: &str = "RETAIL_QA_OUTPUT_DIR";
pub const ENV_LOG_FILE: &str = "RETAIL_QA_LOG_FILE";
pub const ENV_TOP_N: &str = "RETAIL_QA_TOP_N";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the processed CSV datasets
    pub data_dir: PathBuf,
    /// Where chart specs and filtered transaction slices are written
    pub output_dir: PathBuf,
    /// Append-only execution log (CSV)
    pub log_file: PathBuf,
    pub default_top_n: usize,
    pub synonym_matching: SynonymMatching,
    /// Enables a Jaro-Winkler stage in entity normalization when set
    pub fuzzy_threshold: Option<f64>,
    pub files: DatasetFiles,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetFiles {
    pub summary: String,
    pub countries_revenue: String,
    pub products_revenue: String,
    pub monthly_revenue: String,
    pub transactions: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            summary: "summary_statistics.csv".to_string(),
            countries_revenue: "countries_revenue.csv".to_string(),
            products_revenue: "products_revenue.csv".to_string(),
            monthly_revenue: "monthly_revenue.csv".to_string(),
            transactions: "transactions.csv".to_string(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data/processed"),
            output_dir: PathBuf::from("reports"),
            log_file: PathBuf::from("reports/query_log.csv"),
            default_top_n: 5,
            synonym_matching: SynonymMatching::Substring,
            fuzzy_threshold: None,
            files: DatasetFiles::default(),
        }
    }
}

impl AppConfig {
    /// Load a JSON config file; missing keys keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            QaError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config: AppConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from the process environment.
    pub fn with_env(self) -> Result<Self> {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup (the environment in production).
    pub fn with_env_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            debug!("{} overrides data_dir", ENV_DATA_DIR);
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(file) = lookup(ENV_LOG_FILE) {
            self.log_file = PathBuf::from(file);
        }
        if let Some(n) = lookup(ENV_TOP_N) {
            self.default_top_n = n
                .trim()
                .parse()
                .map_err(|_| QaError::Config(format!("{} must be a positive integer, got '{}'", ENV_TOP_N, n)))?;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_top_n == 0 {
            return Err(QaError::Config("default_top_n must be at least 1".to_string()));
        }
        if let Some(threshold) = self.fuzzy_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(QaError::Config(format!(
                    "fuzzy_threshold must be within 0.0..=1.0, got {}",
                    threshold
                )));
            }
        }
        Ok(())
    }
}
