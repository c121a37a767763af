//! Dataset catalog
//!
//! Fixed mapping from each resolvable `Category` to the dataset that backs it and
//! the columns, top-N semantics and chart kind the handler applies.

use crate::category::Category;
use crate::chart::ChartKind;
use crate::config::DatasetFiles;
use crate::error::{QaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Summary,
    CountriesRevenue,
    ProductsRevenue,
    MonthlyRevenue,
    Transactions,
}

impl DatasetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::Summary => "summary",
            DatasetKind::CountriesRevenue => "countries_revenue",
            DatasetKind::ProductsRevenue => "products_revenue",
            DatasetKind::MonthlyRevenue => "monthly_revenue",
            DatasetKind::Transactions => "transactions",
        }
    }

    pub fn file_name<'a>(&self, files: &'a DatasetFiles) -> &'a str {
        match self {
            DatasetKind::Summary => &files.summary,
            DatasetKind::CountriesRevenue => &files.countries_revenue,
            DatasetKind::ProductsRevenue => &files.products_revenue,
            DatasetKind::MonthlyRevenue => &files.monthly_revenue,
            DatasetKind::Transactions => &files.transactions,
        }
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names of the transactions dataset, shared by every handler that
/// filters it.
pub mod transactions {
    pub const COUNTRY: &str = "Country";
    pub const DESCRIPTION: &str = "Description";
    pub const REVENUE: &str = "Revenue";
    pub const YEAR_MONTH: &str = "YearMonth";
}

/// Column names of the summary dataset.
pub mod summary {
    pub const TOTAL_CUSTOMERS: &str = "TotalCustomers";
    pub const TOTAL_REVENUE: &str = "Total_Revenue";
}

/// Per-category handler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySpec {
    pub dataset: DatasetKind,
    /// Label column; `None` for scalar reads
    pub name_column: Option<String>,
    pub value_column: String,
    pub top_n: bool,
    /// `None` when the category never charts
    pub chart: Option<ChartKind>,
}

impl CategorySpec {
    fn new(
        dataset: DatasetKind,
        name_column: Option<&str>,
        value_column: &str,
        top_n: bool,
        chart: Option<ChartKind>,
    ) -> Self {
        Self {
            dataset,
            name_column: name_column.map(str::to_string),
            value_column: value_column.to_string(),
            top_n,
            chart,
        }
    }

    /// Every column a handler will read for this category.
    pub fn required_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = self.name_column.iter().map(String::as_str).collect();
        columns.push(&self.value_column);
        columns
    }
}

#[derive(Debug, Clone)]
pub struct DatasetCatalog {
    specs: HashMap<Category, CategorySpec>,
}

impl Default for DatasetCatalog {
    fn default() -> Self {
        use DatasetKind::*;

        let mut specs = HashMap::new();
        specs.insert(
            Category::Customers,
            CategorySpec::new(Summary, None, summary::TOTAL_CUSTOMERS, false, None),
        );
        specs.insert(
            Category::Revenue,
            CategorySpec::new(Summary, None, summary::TOTAL_REVENUE, false, None),
        );
        specs.insert(
            Category::Countries,
            CategorySpec::new(CountriesRevenue, Some("Country"), "Revenue", true, Some(ChartKind::Bar)),
        );
        specs.insert(
            Category::Products,
            CategorySpec::new(
                ProductsRevenue,
                Some("Description"),
                "Revenue",
                true,
                Some(ChartKind::HorizontalBar),
            ),
        );
        specs.insert(
            Category::MonthlyRevenue,
            CategorySpec::new(MonthlyRevenue, Some("YearMonth"), "Revenue", false, Some(ChartKind::Line)),
        );
        specs.insert(
            Category::Transactions,
            CategorySpec::new(
                Transactions,
                Some(transactions::COUNTRY),
                transactions::REVENUE,
                false,
                None,
            ),
        );
        specs.insert(
            Category::CompareTotal,
            CategorySpec::new(
                Transactions,
                Some(transactions::COUNTRY),
                transactions::REVENUE,
                false,
                Some(ChartKind::Bar),
            ),
        );
        specs.insert(
            Category::CompareMonthly,
            CategorySpec::new(
                Transactions,
                Some(transactions::YEAR_MONTH),
                transactions::REVENUE,
                false,
                Some(ChartKind::MultiLine),
            ),
        );

        Self { specs }
    }
}

impl DatasetCatalog {
    pub fn from_specs(specs: HashMap<Category, CategorySpec>) -> Self {
        Self { specs }
    }

    pub fn spec(&self, category: Category) -> Result<&CategorySpec> {
        self.specs.get(&category).ok_or_else(|| {
            QaError::Config(format!("No dataset configured for category {}", category))
        })
    }

    /// Checks that every resolvable category has a complete, consistent entry.
    pub fn validate(&self) -> Result<()> {
        if self.specs.contains_key(&Category::Unresolved) {
            return Err(QaError::Config(
                "The unresolved category must not be bound to a dataset".to_string(),
            ));
        }
        for category in Category::RESOLVABLE {
            let spec = self.spec(category)?;
            if spec.value_column.trim().is_empty() {
                return Err(QaError::Config(format!("{} declares an empty value column", category)));
            }
            if spec.top_n && spec.name_column.is_none() {
                return Err(QaError::Config(format!(
                    "{} uses top-N semantics but declares no name column",
                    category
                )));
            }
            if spec.chart.is_some() && spec.name_column.is_none() {
                return Err(QaError::Config(format!(
                    "{} is charted but declares no name column for the x axis",
                    category
                )));
            }
            if category.is_comparison() && spec.dataset != DatasetKind::Transactions {
                return Err(QaError::Config(format!(
                    "{} must be backed by the transactions dataset",
                    category
                )));
            }
        }
        Ok(())
    }
}
