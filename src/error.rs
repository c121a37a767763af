use thiserror::Error;

#[derive(Error, Debug)]
pub enum QaError {
    #[error("Dataset unavailable: {dataset} ({path})")]
    DatasetUnavailable { dataset: String, path: String },

    #[error("Schema mismatch: dataset {dataset} has no column '{column}'. Available columns: {available:?}")]
    SchemaMismatch {
        dataset: String,
        column: String,
        available: Vec<String>,
    },

    #[error("Empty result set: {0}")]
    EmptyResultSet(String),

    #[error("Could not extract two entities to compare from: {0}")]
    ComparisonExtractionFailure(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for QaError {
    fn from(err: polars::error::PolarsError) -> Self {
        QaError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QaError>;
