//! Dispatch Engine
//!
//! Drives one question through classify → extract → normalize → handle → log.
//! Every turn ends with exactly one execution record and the engine back in
//! `EngineState::Idle`, whatever happened in between.

use crate::catalog::DatasetCatalog;
use crate::category::{Category, MatchStage};
use crate::chart::{ChartSink, JsonChartSink};
use crate::config::AppConfig;
use crate::datasets::DatasetStore;
use crate::error::Result;
use crate::handlers::{self, HandlerContext, HandlerOutput, NormalizedEntities};
use crate::intent::{extract_entity_mention, extract_top_n, Classification, IntentClassifier, QueryParameters};
use crate::normalizer::EntityNormalizer;
use crate::observability::{ExecutionLogger, LogRecord};
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

const HELP_TEXT: &str = "Sorry, I didn't understand that. Try one of these:\n\
  - How many customers do we have?\n\
  - What is the total revenue?\n\
  - Revenue for Germany\n\
  - Top 5 countries by revenue\n\
  - Top 5 products in the UK\n\
  - Monthly revenue trend\n\
  - Transactions in France\n\
  - Compare revenue France vs Germany\n\
  - Compare monthly revenue France vs Germany";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Classifying,
    Unresolved,
    Extracting,
    Normalizing,
    Handling,
    Logging,
}

impl fmt::Display for EngineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineState::Idle => "idle",
            EngineState::Classifying => "classifying",
            EngineState::Unresolved => "unresolved",
            EngineState::Extracting => "extracting",
            EngineState::Normalizing => "normalizing",
            EngineState::Handling => "handling",
            EngineState::Logging => "logging",
        };
        write!(f, "{}", name)
    }
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnStatus {
    Success,
    Fallback,
    Failed(String),
}

impl TurnStatus {
    /// Value written to the `status` column of the execution log.
    pub fn log_value(&self) -> String {
        match self {
            TurnStatus::Success => "success".to_string(),
            TurnStatus::Fallback => "fallback".to_string(),
            TurnStatus::Failed(reason) => reason.clone(),
        }
    }
}

/// What the caller gets back for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub query_id: String,
    pub text: String,
    pub category: Category,
    pub stage: MatchStage,
    pub status: TurnStatus,
    pub rows: usize,
    pub chart: Option<PathBuf>,
}

pub struct DispatchEngine {
    config: AppConfig,
    classifier: IntentClassifier,
    store: DatasetStore,
    catalog: DatasetCatalog,
    normalizer: EntityNormalizer,
    charts: Box<dyn ChartSink>,
    logger: ExecutionLogger,
    state: EngineState,
}

impl DispatchEngine {
    /// Engine writing chart specs as JSON into `config.output_dir`.
    pub fn new(config: AppConfig) -> Result<Self> {
        let charts = Box::new(JsonChartSink::new(config.output_dir.clone()));
        Self::with_chart_sink(config, charts)
    }

    pub fn with_chart_sink(config: AppConfig, charts: Box<dyn ChartSink>) -> Result<Self> {
        config.validate()?;
        let catalog = DatasetCatalog::default();
        catalog.validate()?;

        let store = DatasetStore::new(config.data_dir.clone(), config.files.clone());
        let normalizer = EntityNormalizer::new(store.clone(), config.fuzzy_threshold);
        let logger = ExecutionLogger::open(config.log_file.clone())?;
        info!(
            "Dispatch engine ready (data: {}, output: {}, log: {})",
            config.data_dir.display(),
            config.output_dir.display(),
            config.log_file.display()
        );

        Ok(Self {
            classifier: IntentClassifier::new(config.synonym_matching),
            config,
            store,
            catalog,
            normalizer,
            charts,
            logger,
            state: EngineState::Idle,
        })
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn logger(&self) -> &ExecutionLogger {
        &self.logger
    }

    pub fn normalizer(&self) -> &EntityNormalizer {
        &self.normalizer
    }

    /// Answer one question. Never fails: problems surface in the answer text
    /// and in the execution log.
    pub fn ask(&mut self, query: &str) -> Answer {
        let started = Instant::now();
        let query_id = uuid::Uuid::new_v4().to_string();

        self.transition(EngineState::Classifying);
        let classification = self.classifier.classify(query);

        let (text, status, rows, chart) = if classification.category == Category::Unresolved {
            self.transition(EngineState::Unresolved);
            (HELP_TEXT.to_string(), TurnStatus::Fallback, 0, None)
        } else {
            match self.dispatch(query, &classification) {
                Ok(output) => (output.report, TurnStatus::Success, output.rows, output.chart),
                Err(e) => {
                    warn!("Query '{}' failed in {}: {}", query, self.state, e);
                    (
                        format!("Sorry, I couldn't answer that: {}", e),
                        TurnStatus::Failed(e.to_string()),
                        0,
                        None,
                    )
                }
            }
        };

        let answer = Answer {
            query_id,
            text,
            category: classification.category,
            stage: classification.stage,
            status,
            rows,
            chart,
        };

        self.transition(EngineState::Logging);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        if let Err(e) = self.logger.append(&log_record(query, &answer, elapsed_ms)) {
            warn!("Failed to write execution log {}: {}", self.logger.path().display(), e);
        }
        info!(
            "Answered '{}' as {} via {} ({}, {} rows, {} ms)",
            query,
            answer.category,
            answer.stage,
            answer.status.log_value(),
            answer.rows,
            elapsed_ms
        );

        self.transition(EngineState::Idle);
        answer
    }

    fn dispatch(&mut self, query: &str, classification: &Classification) -> Result<HandlerOutput> {
        let category = classification.category;

        self.transition(EngineState::Extracting);
        let params = QueryParameters {
            top_n: extract_top_n(query, self.config.default_top_n),
            entity: classification
                .entity
                .clone()
                .or_else(|| extract_entity_mention(query)),
            compared: classification.compared.clone(),
        };
        debug!("Parameters for {}: {:?}", category, params);

        self.transition(EngineState::Normalizing);
        let mut entities = NormalizedEntities::default();
        if handlers::uses_entity(category) {
            entities.entity = params.entity.as_deref().map(|raw| self.normalizer.resolve(raw));
        }
        if category.is_comparison() {
            entities.compared = params
                .compared
                .as_ref()
                .map(|(a, b)| (self.normalizer.resolve(a), self.normalizer.resolve(b)));
        }

        self.transition(EngineState::Handling);
        let ctx = HandlerContext {
            store: &self.store,
            catalog: &self.catalog,
            charts: self.charts.as_ref(),
            output_dir: &self.config.output_dir,
        };
        handlers::handle(&ctx, category, &params, &entities)
    }

    fn transition(&mut self, next: EngineState) {
        debug!("Engine {} -> {}", self.state, next);
        self.state = next;
    }
}

fn log_record(query: &str, answer: &Answer, elapsed_ms: u64) -> LogRecord {
    LogRecord {
        query_id: answer.query_id.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        query: query.to_string(),
        category: match answer.category {
            Category::Unresolved => String::new(),
            category => category.as_str().to_string(),
        },
        status: answer.status.log_value(),
        rows: answer.rows,
        plot: answer.chart.is_some(),
        match_stage: answer.stage.as_str().to_string(),
        elapsed_ms,
    }
}
