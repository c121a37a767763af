//! Query categories and match stages
//!
//! The closed set of intents a query can resolve to, plus the synonym lists and
//! priority ranking used by the keyword fallback stage of the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Customers,
    Revenue,
    Countries,
    Products,
    MonthlyRevenue,
    Transactions,
    CompareTotal,
    CompareMonthly,
    Unresolved,
}

impl Category {
    /// Every category a query can be routed to (excludes `Unresolved`).
    pub const RESOLVABLE: [Category; 8] = [
        Category::Customers,
        Category::Revenue,
        Category::Countries,
        Category::Products,
        Category::MonthlyRevenue,
        Category::Transactions,
        Category::CompareTotal,
        Category::CompareMonthly,
    ];

    /// Categories reachable through the synonym fallback, in priority order.
    pub const SYNONYM_PRIORITY: [Category; 6] = [
        Category::MonthlyRevenue,
        Category::Countries,
        Category::Products,
        Category::Transactions,
        Category::Customers,
        Category::Revenue,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Customers => "customers",
            Category::Revenue => "revenue",
            Category::Countries => "countries",
            Category::Products => "products",
            Category::MonthlyRevenue => "monthly_revenue",
            Category::Transactions => "transactions",
            Category::CompareTotal => "compare_total",
            Category::CompareMonthly => "compare_monthly",
            Category::Unresolved => "unresolved",
        }
    }

    /// Keyword list for the synonym stage. Comparison categories are only
    /// reachable through pattern rules.
    pub fn synonyms(&self) -> &'static [&'static str] {
        match self {
            Category::Customers => &["customer", "customers", "buyers", "clients", "shoppers"],
            Category::Revenue => &["revenue", "sales", "income", "turnover", "earnings"],
            Category::Countries => &["country", "countries", "region", "regions", "nation"],
            Category::Products => &["product", "products", "item", "items", "best seller", "bestseller"],
            Category::MonthlyRevenue => &["monthly", "per month", "by month", "trend", "over time"],
            Category::Transactions => &["transaction", "transactions", "orders", "invoice", "invoices", "purchases"],
            Category::CompareTotal | Category::CompareMonthly | Category::Unresolved => &[],
        }
    }

    /// Tie-break rank for the synonym stage; lower wins.
    pub fn synonym_rank(&self) -> Option<usize> {
        Self::SYNONYM_PRIORITY.iter().position(|c| c == self)
    }

    pub fn is_comparison(&self) -> bool {
        matches!(self, Category::CompareTotal | Category::CompareMonthly)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which classification stage produced the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStage {
    Pattern,
    Synonym,
    Unresolved,
}

impl MatchStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStage::Pattern => "pattern",
            MatchStage::Synonym => "synonym",
            MatchStage::Unresolved => "unresolved",
        }
    }
}

impl fmt::Display for MatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
