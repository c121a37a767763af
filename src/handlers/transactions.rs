//! Transactions handler: transactions of one country, with the filtered slice
//! persisted next to the other report artifacts.

use super::{format_amount, no_data_report, HandlerContext, HandlerOutput};
use crate::category::Category;
use crate::chart::artifact_name;
use crate::datasets::{column_sum, filter_equals, write_csv};
use crate::error::{QaError, Result};
use crate::normalizer::ResolvedEntity;
use tracing::info;

pub fn handle(ctx: &HandlerContext<'_>, entity: Option<&ResolvedEntity>) -> Result<HandlerOutput> {
    let spec = ctx.catalog.spec(Category::Transactions)?;
    let entity_column = spec
        .name_column
        .as_deref()
        .ok_or_else(|| QaError::Config("transactions has no entity column".to_string()))?;
    let df = ctx
        .store
        .load_with_columns(spec.dataset, &spec.required_columns())?;

    let Some(entity) = entity else {
        let total = column_sum(&df, &spec.value_column)?;
        return Ok(HandlerOutput::text(
            format!(
                "There are {} transactions in total, worth {}. Ask for 'transactions in <country>' to narrow it down.",
                df.height(),
                format_amount(total)
            ),
            df.height(),
        ));
    };

    let filtered = filter_equals(&df, entity_column, &entity.canonical)?;
    if filtered.height() == 0 {
        return Ok(HandlerOutput::text(no_data_report(entity, "transactions"), 0));
    }

    let total = column_sum(&filtered, &spec.value_column)?;
    let path = ctx
        .output_dir
        .join(format!("transactions_{}.csv", artifact_name(&entity.canonical)));
    write_csv(&filtered, &path)?;
    info!("💾 Saved {} transactions for {} to {}", filtered.height(), entity.canonical, path.display());

    Ok(HandlerOutput::text(
        format!(
            "Found {} transactions in {} with total revenue {}. Saved to {}",
            filtered.height(),
            entity.canonical,
            format_amount(total),
            path.display()
        ),
        filtered.height(),
    ))
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use std::fs;

    #[test]
    fn test_transactions_in_country() {
        let fixture = Fixture::new();
        let france = recognized("france", "France");
        let out = handle(&fixture.ctx(), Some(&france)).unwrap();

        assert_eq!(out.rows, 2);
        assert!(!out.chart_emitted());
        assert!(out.report.starts_with("Found 2 transactions in France with total revenue 15.50."));

        let slice = fixture.dir.path().join("transactions_france.csv");
        let text = fs::read_to_string(slice).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.lines().skip(1).all(|line| line.contains("France")));
    }

    #[test]
    fn test_no_data_vs_unrecognized() {
        let fixture = Fixture::new();

        let out = handle(&fixture.ctx(), Some(&recognized("spain", "Spain"))).unwrap();
        assert_eq!(out.rows, 0);
        assert_eq!(out.report, "No transactions found for Spain.");

        let out = handle(&fixture.ctx(), Some(&unrecognized("atlantis"))).unwrap();
        assert_eq!(out.rows, 0);
        assert!(out.report.starts_with("I don't recognize 'atlantis'"));
        assert!(!fixture.dir.path().join("transactions_atlantis.csv").exists());
    }

    #[test]
    fn test_without_entity_reports_overall() {
        let fixture = Fixture::new();
        let out = handle(&fixture.ctx(), None).unwrap();
        assert_eq!(out.rows, 7);
        assert!(out.report.starts_with("There are 7 transactions in total, worth 100.80."));
    }
}
