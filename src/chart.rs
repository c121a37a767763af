//! Chart sink
//!
//! Handlers describe a chart as a `ChartSpec` (kind, x labels, one or more named
//! series) and hand it to a `ChartSink`. The default sink writes the spec as a
//! chart-ready JSON document next to the other report artifacts; a rendering
//! backend can consume those files or replace the sink entirely.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    HorizontalBar,
    Line,
    MultiLine,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub label: String,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub kind: ChartKind,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<String>,
    pub series: Vec<ChartSeries>,
}

impl ChartSpec {
    /// Single-series chart.
    pub fn single(
        title: impl Into<String>,
        kind: ChartKind,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        x: Vec<String>,
        values: Vec<f64>,
    ) -> Self {
        let y_label = y_label.into();
        Self {
            title: title.into(),
            kind,
            x_label: x_label.into(),
            series: vec![ChartSeries {
                label: y_label.clone(),
                values,
            }],
            y_label,
            x,
        }
    }
}

/// Accepts chart specs and produces an artifact.
pub trait ChartSink {
    /// Render `spec` under the artifact name `name`; returns the artifact path.
    fn render(&self, name: &str, spec: &ChartSpec) -> Result<PathBuf>;
}

/// Writes `<output_dir>/<name>.json`.
pub struct JsonChartSink {
    output_dir: PathBuf,
}

impl JsonChartSink {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

impl ChartSink for JsonChartSink {
    fn render(&self, name: &str, spec: &ChartSpec) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;
        let path = self.output_dir.join(format!("{}.json", artifact_name(name)));
        let json = serde_json::to_string_pretty(spec)?;
        fs::write(&path, json)?;
        info!("📊 Chart written to {}", path.display());
        Ok(path)
    }
}

/// Lowercase, ASCII alphanumerics and underscores only.
pub fn artifact_name(raw: &str) -> String {
    let mut name = String::with_capacity(raw.len());
    let mut last_underscore = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() {
            name.push(c.to_ascii_lowercase());
            last_underscore = false;
        } else if !last_underscore && !name.is_empty() {
            name.push('_');
            last_underscore = true;
        }
    }
    while name.ends_with('_') {
        name.pop();
    }
    if name.is_empty() {
        "chart".to_string()
    } else {
        name
    }
}
