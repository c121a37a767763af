//! Category Handlers
//!
//! One handler per resolved category. Each loads its backing dataset through the
//! `DatasetStore`, filters/aggregates, optionally hands a chart to the sink and
//! returns a textual report.

pub mod compare;
pub mod scalar;
pub mod top_n;
pub mod transactions;
pub mod trend;

use crate::catalog::DatasetCatalog;
use crate::category::Category;
use crate::chart::ChartSink;
use crate::datasets::DatasetStore;
use crate::error::{QaError, Result};
use crate::intent::QueryParameters;
use crate::normalizer::ResolvedEntity;
use std::path::{Path, PathBuf};

/// Shared, read-only collaborators for one handler invocation.
pub struct HandlerContext<'a> {
    pub store: &'a DatasetStore,
    pub catalog: &'a DatasetCatalog,
    pub charts: &'a dyn ChartSink,
    pub output_dir: &'a Path,
}

/// Entities after normalization, as needed by the chosen handler.
#[derive(Debug, Clone, Default)]
pub struct NormalizedEntities {
    pub entity: Option<ResolvedEntity>,
    pub compared: Option<(ResolvedEntity, ResolvedEntity)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    pub report: String,
    pub rows: usize,
    pub chart: Option<PathBuf>,
}

impl HandlerOutput {
    pub fn text(report: impl Into<String>, rows: usize) -> Self {
        Self {
            report: report.into(),
            rows,
            chart: None,
        }
    }

    pub fn with_chart(mut self, chart: PathBuf) -> Self {
        self.chart = Some(chart);
        self
    }

    pub fn chart_emitted(&self) -> bool {
        self.chart.is_some()
    }
}

/// Whether the handler for `category` consumes a single entity mention.
pub fn uses_entity(category: Category) -> bool {
    matches!(
        category,
        Category::Revenue | Category::Products | Category::Transactions
    )
}

/// Route to the handler owning `category`.
pub fn handle(
    ctx: &HandlerContext<'_>,
    category: Category,
    params: &QueryParameters,
    entities: &NormalizedEntities,
) -> Result<HandlerOutput> {
    let entity = entities.entity.as_ref();
    match category {
        Category::Customers | Category::Revenue => scalar::handle(ctx, category, entity),
        Category::Countries | Category::Products => top_n::handle(ctx, category, params.top_n, entity),
        Category::MonthlyRevenue => trend::handle(ctx),
        Category::Transactions => transactions::handle(ctx, entity),
        Category::CompareTotal | Category::CompareMonthly => {
            compare::handle(ctx, category, entities.compared.as_ref())
        }
        Category::Unresolved => Err(QaError::Config(
            "unresolved queries have no handler".to_string(),
        )),
    }
}

/// Report text for a filter that matched nothing, distinguishing an entity the
/// normalizer could not recognize from a known entity without data.
pub(crate) fn no_data_report(entity: &ResolvedEntity, what: &str) -> String {
    if entity.is_recognized() {
        format!("No {} found for {}.", what, entity.canonical)
    } else {
        format!(
            "I don't recognize '{}' as a country, so there are no {} for it.",
            entity.raw.trim(),
            what
        )
    }
}

pub(crate) fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Fixture datasets and a recording chart sink shared by handler tests.

    use super::*;
    use crate::chart::ChartSpec;
    use crate::config::DatasetFiles;
    use std::cell::RefCell;
    use std::fs;

    pub const SUMMARY: &str = "TotalCustomers,TotalProducts,Total_Revenue\n4372,3684,9747747.934\n";
    pub const COUNTRIES: &str = "Country,Revenue\n\
        United Kingdom,8187806.36\nNetherlands,284661.54\nEIRE,263276.82\n\
        Germany,221698.21\nFrance,197403.9\nSpain,54774.58\nPortugal,29367.02\nSweden,36595.91\n";
    pub const PRODUCTS: &str = "Description,Revenue\n\
        DOTCOM POSTAGE,206245.48\nREGENCY CAKESTAND 3 TIER,164762.19\n\
        WHITE HANGING HEART T-LIGHT HOLDER,99668.47\nPARTY BUNTING,98302.98\n\
        JUMBO BAG RED RETROSPOT,92356.03\nRABBIT NIGHT LIGHT,66756.59\n";
    pub const MONTHLY: &str = "YearMonth,Revenue\n2011-02,498062.65\n2010-12,748957.02\n2011-01,560000.26\n";
    pub const TRANSACTIONS: &str = "TransactionID,Date,Country,Description,Revenue,Quantity,YearMonth\n\
        536365,2010-12-01 08:26,United Kingdom,MUG,15.3,6,2010-12\n\
        536366,2010-12-01 08:28,United Kingdom,LAMP,22.0,2,2010-12\n\
        536367,2010-12-01 08:34,France,MUG,10.0,4,2010-12\n\
        536368,2011-01-04 10:00,France,CANDLE,5.5,1,2011-01\n\
        536369,2011-01-05 11:00,Germany,MUG,7.0,2,2011-01\n\
        536370,2011-02-01 09:00,United Kingdom,MUG,30.0,12,2011-02\n\
        536371,2011-02-02 09:30,Germany,LAMP,11.0,1,2011-02\n";

    pub struct Fixture {
        pub dir: tempfile::TempDir,
        pub store: DatasetStore,
        pub catalog: DatasetCatalog,
        pub sink: RecordingSink,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self::with_files(&[
                ("summary_statistics.csv", SUMMARY),
                ("countries_revenue.csv", COUNTRIES),
                ("products_revenue.csv", PRODUCTS),
                ("monthly_revenue.csv", MONTHLY),
                ("transactions.csv", TRANSACTIONS),
            ])
        }

        pub fn with_files(files: &[(&str, &str)]) -> Self {
            let dir = tempfile::tempdir().unwrap();
            for (name, content) in files {
                fs::write(dir.path().join(name), content).unwrap();
            }
            let store = DatasetStore::new(dir.path(), DatasetFiles::default());
            Self {
                store,
                catalog: DatasetCatalog::default(),
                sink: RecordingSink::default(),
                dir,
            }
        }

        pub fn ctx(&self) -> HandlerContext<'_> {
            HandlerContext {
                store: &self.store,
                catalog: &self.catalog,
                charts: &self.sink,
                output_dir: self.dir.path(),
            }
        }
    }

    #[derive(Default)]
    pub struct RecordingSink {
        pub rendered: RefCell<Vec<(String, ChartSpec)>>,
    }

    impl ChartSink for RecordingSink {
        fn render(&self, name: &str, spec: &ChartSpec) -> Result<PathBuf> {
            self.rendered.borrow_mut().push((name.to_string(), spec.clone()));
            Ok(PathBuf::from(format!("{}.json", name)))
        }
    }

    pub fn recognized(raw: &str, canonical: &str) -> ResolvedEntity {
        ResolvedEntity {
            raw: raw.to_string(),
            canonical: canonical.to_string(),
            source: crate::normalizer::EntitySource::Alias,
        }
    }

    pub fn unrecognized(raw: &str) -> ResolvedEntity {
        ResolvedEntity {
            raw: raw.to_string(),
            canonical: crate::normalizer::title_case(raw),
            source: crate::normalizer::EntitySource::Unrecognized,
        }
    }
}
