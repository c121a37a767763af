//! Retail QA: natural-language questions over preprocessed retail datasets.
//!
//! A question is classified into a category, its parameters are extracted and
//! normalized, and the owning handler answers it from the CSV datasets,
//! optionally emitting a chart. Every turn is recorded in an execution log.

pub mod catalog;
pub mod category;
pub mod chart;
pub mod config;
pub mod datasets;
pub mod engine;
pub mod error;
pub mod handlers;
pub mod intent;
pub mod normalizer;
pub mod observability;

pub use category::{Category, MatchStage};
pub use config::AppConfig;
pub use engine::{Answer, DispatchEngine, EngineState, TurnStatus};
pub use error::{QaError, Result};
