//! Single-value handler: total customers, total revenue, or one country's revenue.

use super::{format_amount, no_data_report, HandlerContext, HandlerOutput};
use crate::category::Category;
use crate::datasets::{filter_equals, float_values};
use crate::error::{QaError, Result};
use crate::normalizer::ResolvedEntity;
use tracing::debug;

pub fn handle(
    ctx: &HandlerContext<'_>,
    category: Category,
    entity: Option<&ResolvedEntity>,
) -> Result<HandlerOutput> {
    match (category, entity) {
        (Category::Revenue, Some(entity)) => revenue_for(ctx, entity),
        _ => summary_value(ctx, category),
    }
}

fn summary_value(ctx: &HandlerContext<'_>, category: Category) -> Result<HandlerOutput> {
    let spec = ctx.catalog.spec(category)?;
    let df = ctx
        .store
        .load_with_columns(spec.dataset, &spec.required_columns())?;
    let value = float_values(&df, &spec.value_column)?
        .first()
        .copied()
        .ok_or_else(|| QaError::EmptyResultSet(format!("{} dataset has no rows", spec.dataset)))?;

    let report = match category {
        Category::Customers => format!("Total Customers: {:.0}", value),
        _ => format!("Total Revenue: {}", format_amount(value)),
    };
    Ok(HandlerOutput::text(report, 1))
}

/// Revenue subtotal for one entity, read from the per-country revenue table.
fn revenue_for(ctx: &HandlerContext<'_>, entity: &ResolvedEntity) -> Result<HandlerOutput> {
    let spec = ctx.catalog.spec(Category::Countries)?;
    let name_column = spec
        .name_column
        .as_deref()
        .ok_or_else(|| QaError::Config("countries spec has no name column".to_string()))?;
    let df = ctx
        .store
        .load_with_columns(spec.dataset, &spec.required_columns())?;

    let filtered = filter_equals(&df, name_column, &entity.canonical)?;
    debug!("Revenue filter for {} matched {} rows", entity.canonical, filtered.height());
    if filtered.height() == 0 {
        return Ok(HandlerOutput::text(no_data_report(entity, "revenue figures"), 0));
    }

    let total: f64 = float_values(&filtered, &spec.value_column)?.iter().sum();
    Ok(HandlerOutput::text(
        format!("Revenue for {}: {}", entity.canonical, format_amount(total)),
        filtered.height(),
    ))
}
