//! Observability: per-query execution records.

pub mod execution_log;

pub use execution_log::{ExecutionLogger, LogRecord};
