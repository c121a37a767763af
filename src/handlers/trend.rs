//! Trend handler: the full monthly revenue series, always charted as a line.

use super::{format_amount, HandlerContext, HandlerOutput};
use crate::category::Category;
use crate::chart::{ChartKind, ChartSpec};
use crate::datasets::{float_values, string_values};
use crate::error::{QaError, Result};

pub fn handle(ctx: &HandlerContext<'_>) -> Result<HandlerOutput> {
    let spec = ctx.catalog.spec(Category::MonthlyRevenue)?;
    let period_column = spec
        .name_column
        .as_deref()
        .ok_or_else(|| QaError::Config("monthly_revenue has no period column".to_string()))?;
    let df = ctx
        .store
        .load_with_columns(spec.dataset, &spec.required_columns())?;

    // YYYY-MM keys order chronologically as strings
    let mut series: Vec<(String, f64)> = string_values(&df, period_column)?
        .into_iter()
        .zip(float_values(&df, &spec.value_column)?)
        .collect();
    series.sort_by(|a, b| a.0.cmp(&b.0));

    let report = trend_report(&series);
    let chart = ChartSpec::single(
        "Monthly revenue trend",
        spec.chart.unwrap_or(ChartKind::Line),
        period_column,
        &spec.value_column,
        series.iter().map(|(period, _)| period.clone()).collect(),
        series.iter().map(|(_, value)| *value).collect(),
    );
    let path = ctx.charts.render(Category::MonthlyRevenue.as_str(), &chart)?;

    Ok(HandlerOutput::text(report, series.len()).with_chart(path))
}

fn trend_report(series: &[(String, f64)]) -> String {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return "No monthly revenue data available.".to_string();
    };

    let mut report = format!(
        "Monthly revenue, {} months ({} to {}):",
        series.len(),
        first.0,
        last.0
    );
    for (period, value) in series {
        report.push_str(&format!("\n  {}: {}", period, format_amount(*value)));
    }

    if let Some((period, value)) = series
        .iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
    {
        report.push_str(&format!("\nPeak month: {} ({})", period, format_amount(*value)));
    }
    report
}
