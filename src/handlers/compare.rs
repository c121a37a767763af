//! Comparison handler: two entities side by side, as totals (bar) or as
//! monthly series (multi-line).

use super::{format_amount, HandlerContext, HandlerOutput};
use crate::catalog::transactions;
use crate::category::Category;
use crate::chart::{ChartKind, ChartSeries, ChartSpec};
use crate::datasets::{column_sum, filter_equals, sum_by};
use crate::error::{QaError, Result};
use crate::normalizer::ResolvedEntity;
use itertools::Itertools;
use polars::prelude::DataFrame;
use std::collections::HashMap;
use tracing::info;

pub fn handle(
    ctx: &HandlerContext<'_>,
    category: Category,
    compared: Option<&(ResolvedEntity, ResolvedEntity)>,
) -> Result<HandlerOutput> {
    let (left, right) = compared.ok_or_else(|| {
        QaError::ComparisonExtractionFailure(format!(
            "{} needs two entities, e.g. 'compare revenue France vs Germany'",
            category
        ))
    })?;

    let spec = ctx.catalog.spec(category)?;
    let df = ctx.store.load_with_columns(
        spec.dataset,
        &[transactions::COUNTRY, transactions::REVENUE, transactions::YEAR_MONTH],
    )?;
    let left_df = filter_equals(&df, transactions::COUNTRY, &left.canonical)?;
    let right_df = filter_equals(&df, transactions::COUNTRY, &right.canonical)?;
    info!(
        "Comparing {} ({} rows) with {} ({} rows)",
        left.canonical,
        left_df.height(),
        right.canonical,
        right_df.height()
    );

    if left_df.height() == 0 && right_df.height() == 0 {
        let mut report = format!(
            "No data for either {} or {}.",
            left.canonical, right.canonical
        );
        for entity in [left, right] {
            if !entity.is_recognized() {
                report.push_str(&format!(" '{}' was not recognized as a country.", entity.raw.trim()));
            }
        }
        return Ok(HandlerOutput::text(report, 0));
    }

    let chart_name = format!("{}_{}_vs_{}", category, left.canonical, right.canonical);
    let kind = spec.chart;
    let output = match category {
        Category::CompareMonthly => compare_monthly(ctx, (left, &left_df), (right, &right_df), kind, &chart_name)?,
        _ => compare_total(ctx, (left, &left_df), (right, &right_df), kind, &chart_name)?,
    };
    Ok(output)
}

fn compare_total(
    ctx: &HandlerContext<'_>,
    left: (&ResolvedEntity, &DataFrame),
    right: (&ResolvedEntity, &DataFrame),
    kind: Option<ChartKind>,
    chart_name: &str,
) -> Result<HandlerOutput> {
    let left_total = column_sum(left.1, transactions::REVENUE)?;
    let right_total = column_sum(right.1, transactions::REVENUE)?;

    let mut report = format!(
        "Total revenue, {} vs {}:\n  {}: {}\n  {}: {}",
        left.0.canonical,
        right.0.canonical,
        left.0.canonical,
        format_amount(left_total),
        right.0.canonical,
        format_amount(right_total)
    );
    let (leader, gap) = if left_total >= right_total {
        (&left.0.canonical, left_total - right_total)
    } else {
        (&right.0.canonical, right_total - left_total)
    };
    report.push_str(&format!("\n{} leads by {}.", leader, format_amount(gap)));
    report.push_str(&missing_side_note(left, right));

    let chart = ChartSpec::single(
        format!("Total revenue: {} vs {}", left.0.canonical, right.0.canonical),
        kind.unwrap_or(ChartKind::Bar),
        transactions::COUNTRY,
        transactions::REVENUE,
        vec![left.0.canonical.clone(), right.0.canonical.clone()],
        vec![left_total, right_total],
    );
    let path = ctx.charts.render(chart_name, &chart)?;
    Ok(HandlerOutput::text(report, 2).with_chart(path))
}

fn compare_monthly(
    ctx: &HandlerContext<'_>,
    left: (&ResolvedEntity, &DataFrame),
    right: (&ResolvedEntity, &DataFrame),
    kind: Option<ChartKind>,
    chart_name: &str,
) -> Result<HandlerOutput> {
    let left_months: HashMap<String, f64> =
        sum_by(left.1, transactions::YEAR_MONTH, transactions::REVENUE)?.into_iter().collect();
    let right_months: HashMap<String, f64> =
        sum_by(right.1, transactions::YEAR_MONTH, transactions::REVENUE)?.into_iter().collect();

    let periods: Vec<String> = left_months
        .keys()
        .chain(right_months.keys())
        .cloned()
        .sorted()
        .dedup()
        .collect();
    let aligned = |months: &HashMap<String, f64>| -> Vec<f64> {
        periods
            .iter()
            .map(|p| months.get(p).copied().unwrap_or(0.0))
            .collect()
    };
    let left_values = aligned(&left_months);
    let right_values = aligned(&right_months);

    let mut report = format!(
        "Monthly revenue, {} vs {} ({} months):",
        left.0.canonical,
        right.0.canonical,
        periods.len()
    );
    for (idx, period) in periods.iter().enumerate() {
        report.push_str(&format!(
            "\n  {}: {} {} | {} {}",
            period,
            left.0.canonical,
            format_amount(left_values[idx]),
            right.0.canonical,
            format_amount(right_values[idx])
        ));
    }
    report.push_str(&missing_side_note(left, right));

    let chart = ChartSpec {
        title: format!("Monthly revenue: {} vs {}", left.0.canonical, right.0.canonical),
        kind: kind.unwrap_or(ChartKind::MultiLine),
        x_label: transactions::YEAR_MONTH.to_string(),
        y_label: transactions::REVENUE.to_string(),
        x: periods.clone(),
        series: vec![
            ChartSeries {
                label: left.0.canonical.clone(),
                values: left_values,
            },
            ChartSeries {
                label: right.0.canonical.clone(),
                values: right_values,
            },
        ],
    };
    let path = ctx.charts.render(chart_name, &chart)?;
    Ok(HandlerOutput::text(report, periods.len()).with_chart(path))
}

/// Note for a side that contributed no rows, if any.
fn missing_side_note(left: (&ResolvedEntity, &DataFrame), right: (&ResolvedEntity, &DataFrame)) -> String {
    [left, right]
        .iter()
        .filter(|(_, df)| df.height() == 0)
        .map(|(entity, _)| {
            if entity.is_recognized() {
                format!("\n(No transactions found for {}.)", entity.canonical)
            } else {
                format!("\n('{}' was not recognized as a country.)", entity.raw.trim())
            }
        })
        .collect()
}
