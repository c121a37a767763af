//! Top-N handler: highest-revenue countries or products.
//!
//! Products scoped to a country are aggregated from the transactions dataset
//! rather than read from the pre-aggregated products table.

use super::{format_amount, no_data_report, HandlerContext, HandlerOutput};
use crate::catalog::transactions;
use crate::category::Category;
use crate::chart::{ChartKind, ChartSpec};
use crate::datasets::{filter_equals, float_values, string_values, sum_by};
use crate::error::{QaError, Result};
use crate::normalizer::ResolvedEntity;
use std::cmp::Ordering;
use tracing::info;

pub fn handle(
    ctx: &HandlerContext<'_>,
    category: Category,
    top_n: usize,
    entity: Option<&ResolvedEntity>,
) -> Result<HandlerOutput> {
    match (category, entity) {
        (Category::Products, Some(entity)) => products_in(ctx, top_n, entity),
        _ => from_dataset(ctx, category, top_n),
    }
}

/// Sort descending by value, ties keep their input order, keep at most `n`.
pub fn rank_top_n(mut rows: Vec<(String, f64)>, n: usize) -> Vec<(String, f64)> {
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    rows.truncate(n);
    rows
}

fn from_dataset(ctx: &HandlerContext<'_>, category: Category, top_n: usize) -> Result<HandlerOutput> {
    let spec = ctx.catalog.spec(category)?;
    let name_column = spec
        .name_column
        .as_deref()
        .ok_or_else(|| QaError::Config(format!("{} has no name column", category)))?;
    let df = ctx
        .store
        .load_with_columns(spec.dataset, &spec.required_columns())?;

    let rows: Vec<(String, f64)> = string_values(&df, name_column)?
        .into_iter()
        .zip(float_values(&df, &spec.value_column)?)
        .collect();
    if rows.is_empty() {
        return Ok(HandlerOutput::text(format!("No {} data available.", category), 0));
    }

    let ranked = rank_top_n(rows, top_n);
    let title = format!("Top {} {} by {}", ranked.len(), category, spec.value_column.to_lowercase());
    let report = ranked_report(&title, &ranked);
    let output = HandlerOutput::text(report, ranked.len());

    match spec.chart {
        Some(kind) => {
            let chart = chart_for(&title, kind, name_column, &spec.value_column, &ranked);
            let path = ctx.charts.render(category.as_str(), &chart)?;
            Ok(output.with_chart(path))
        }
        None => Ok(output),
    }
}

fn products_in(ctx: &HandlerContext<'_>, top_n: usize, entity: &ResolvedEntity) -> Result<HandlerOutput> {
    let spec = ctx.catalog.spec(Category::Transactions)?;
    let df = ctx.store.load_with_columns(
        spec.dataset,
        &[transactions::COUNTRY, transactions::DESCRIPTION, transactions::REVENUE],
    )?;

    let filtered = filter_equals(&df, transactions::COUNTRY, &entity.canonical)?;
    if filtered.height() == 0 {
        return Ok(HandlerOutput::text(no_data_report(entity, "product sales"), 0));
    }

    let totals = sum_by(&filtered, transactions::DESCRIPTION, transactions::REVENUE)?;
    let ranked = rank_top_n(totals, top_n);
    info!(
        "Ranked {} products for {} from {} transactions",
        ranked.len(),
        entity.canonical,
        filtered.height()
    );

    let title = format!("Top {} products in {}", ranked.len(), entity.canonical);
    let report = ranked_report(&title, &ranked);
    let output = HandlerOutput::text(report, ranked.len());

    let kind = ctx
        .catalog
        .spec(Category::Products)?
        .chart
        .unwrap_or(ChartKind::HorizontalBar);
    let chart = chart_for(&title, kind, transactions::DESCRIPTION, transactions::REVENUE, &ranked);
    let path = ctx
        .charts
        .render(&format!("products_in_{}", entity.canonical), &chart)?;
    Ok(output.with_chart(path))
}

fn ranked_report(title: &str, ranked: &[(String, f64)]) -> String {
    let mut report = format!("{}:", title);
    for (idx, (name, value)) in ranked.iter().enumerate() {
        report.push_str(&format!("\n  {}. {}: {}", idx + 1, name, format_amount(*value)));
    }
    report
}

fn chart_for(title: &str, kind: ChartKind, x_label: &str, y_label: &str, ranked: &[(String, f64)]) -> ChartSpec {
    ChartSpec::single(
        title,
        kind,
        x_label,
        y_label,
        ranked.iter().map(|(name, _)| name.clone()).collect(),
        ranked.iter().map(|(_, value)| *value).collect(),
    )
}
