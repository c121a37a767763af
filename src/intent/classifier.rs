//! Intent Classifier
//!
//! Two ordered stages:
//! 1. Pattern rules, evaluated in declaration order; the first match wins.
//! 2. Synonym fallback; among all categories with a keyword hit the one with the
//!    best `Category::synonym_rank` wins.
//!
//! Anything else is `Category::Unresolved`.

use super::params::strip_qualifiers;
use crate::category::{Category, MatchStage};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How synonym keywords are matched against the query.
///
/// `Substring` is the default and knowingly imprecise ("borders" contains
/// "orders"). `WordBoundary` only accepts hits delimited by non-alphanumerics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynonymMatching {
    #[default]
    Substring,
    WordBoundary,
}

/// What a pattern rule captures besides the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RuleCapture {
    Nothing,
    Entity,
    Pair,
}

struct PatternRule {
    name: &'static str,
    category: Category,
    regex: Regex,
    capture: RuleCapture,
}

impl PatternRule {
    fn new(name: &'static str, category: Category, pattern: &str, capture: RuleCapture) -> Self {
        Self {
            name,
            category,
            regex: Regex::new(pattern).expect("pattern rule must compile"),
            capture,
        }
    }
}

lazy_static! {
    // Order is the tie-break: the monthly comparison must precede the total one,
    // and both precede the monthly trend rule which would otherwise swallow
    // "compare monthly revenue ...".
    static ref PATTERN_RULES: Vec<PatternRule> = vec![
        PatternRule::new(
            "compare_monthly",
            Category::CompareMonthly,
            r"\bcompare\s+monthly\s+(?:revenue|sales)\b(.*)$",
            RuleCapture::Pair,
        ),
        PatternRule::new(
            "compare_total",
            Category::CompareTotal,
            r"\bcompare\s+(?:total\s+)?(?:revenue|sales)\b(.*)$",
            RuleCapture::Pair,
        ),
        PatternRule::new(
            "monthly_revenue",
            Category::MonthlyRevenue,
            r"\b(?:monthly\s+(?:revenue|sales)|(?:revenue|sales)\s+(?:trend|by\s+month|per\s+month|over\s+time))\b",
            RuleCapture::Nothing,
        ),
        PatternRule::new(
            "countries_top",
            Category::Countries,
            r"\btop\s+(?:\d+\s+)?countries\b",
            RuleCapture::Nothing,
        ),
        PatternRule::new(
            "products_in_country",
            Category::Products,
            r"\btop\s+(?:\d+\s+)?products?\s+(?:in|from)\s+(?:the\s+)?([a-z][a-z .'&-]*)",
            RuleCapture::Entity,
        ),
        PatternRule::new(
            "transactions_in_country",
            Category::Transactions,
            r"\btransactions?\s+(?:in|from|for)\s+(?:the\s+)?([a-z][a-z .'&-]*)",
            RuleCapture::Entity,
        ),
    ];

    static ref PAIR_SPLIT: Regex = Regex::new(
        r"^\s*(?:of\s+|for\s+|between\s+|in\s+)?(?:the\s+)?(.+?)\s+(?:vs\.?|versus|and)\s+(?:the\s+)?(.+?)\s*$"
    )
    .expect("pair split pattern must compile");
}

/// Outcome of classifying one query.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub category: Category,
    pub stage: MatchStage,
    /// Name of the pattern rule that fired, if any
    pub rule: Option<&'static str>,
    /// Entity captured by an entity-bearing pattern rule
    pub entity: Option<String>,
    /// Both sides of a comparison; `None` when a comparison rule fired but the
    /// pair could not be split
    pub compared: Option<(String, String)>,
}

impl Classification {
    fn unresolved() -> Self {
        Self {
            category: Category::Unresolved,
            stage: MatchStage::Unresolved,
            rule: None,
            entity: None,
            compared: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    matching: SynonymMatching,
}

impl IntentClassifier {
    pub fn new(matching: SynonymMatching) -> Self {
        Self { matching }
    }

    pub fn classify(&self, query: &str) -> Classification {
        let q = query.to_lowercase();
        let q = q.trim();

        if let Some(classification) = Self::match_patterns(q) {
            debug!(
                "Query '{}' matched pattern rule {:?} -> {}",
                q, classification.rule, classification.category
            );
            return classification;
        }

        if let Some(category) = self.match_synonyms(q) {
            debug!("Query '{}' matched synonyms -> {}", q, category);
            return Classification {
                category,
                stage: MatchStage::Synonym,
                rule: None,
                entity: None,
                compared: None,
            };
        }

        debug!("Query '{}' is unresolved", q);
        Classification::unresolved()
    }

    fn match_patterns(q: &str) -> Option<Classification> {
        for rule in PATTERN_RULES.iter() {
            let Some(caps) = rule.regex.captures(q) else {
                continue;
            };

            let tail = caps.get(1).map(|m| m.as_str());
            let (entity, compared) = match rule.capture {
                RuleCapture::Nothing => (None, None),
                RuleCapture::Entity => (tail.and_then(clean_entity), None),
                RuleCapture::Pair => (None, tail.and_then(split_pair)),
            };

            return Some(Classification {
                category: rule.category,
                stage: MatchStage::Pattern,
                rule: Some(rule.name),
                entity,
                compared,
            });
        }
        None
    }

    fn match_synonyms(&self, q: &str) -> Option<Category> {
        Category::SYNONYM_PRIORITY
            .iter()
            .filter(|category| {
                category
                    .synonyms()
                    .iter()
                    .any(|synonym| self.synonym_hit(q, synonym))
            })
            .min_by_key(|category| category.synonym_rank())
            .copied()
    }

    fn synonym_hit(&self, q: &str, synonym: &str) -> bool {
        match self.matching {
            SynonymMatching::Substring => q.contains(synonym),
            SynonymMatching::WordBoundary => contains_word(q, synonym),
        }
    }
}

/// True when `needle` occurs in `haystack` delimited by non-alphanumerics.
fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric());
        let after_ok = haystack[end..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric());
        before_ok && after_ok
    })
}

fn clean_entity(raw: &str) -> Option<String> {
    let stripped = strip_qualifiers(raw);
    let cleaned = stripped
        .trim()
        .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!' || c.is_whitespace())
        .trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn split_pair(tail: &str) -> Option<(String, String)> {
    let caps = PAIR_SPLIT.captures(tail)?;
    let left = clean_entity(caps.get(1)?.as_str())?;
    let right = clean_entity(caps.get(2)?.as_str())?;
    Some((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(q: &str) -> Classification {
        IntentClassifier::default().classify(q)
    }

    #[test]
    fn test_top_countries_pattern() {
        let c = classify("top 3 countries");
        assert_eq!(c.category, Category::Countries);
        assert_eq!(c.stage, MatchStage::Pattern);
        assert_eq!(c.rule, Some("countries_top"));
    }

    #[test]
    fn test_monthly_revenue_pattern() {
        let c = classify("Monthly revenue trend");
        assert_eq!(c.category, Category::MonthlyRevenue);
        assert_eq!(c.stage, MatchStage::Pattern);
        assert_eq!(c.rule, Some("monthly_revenue"));

        let c = classify("show me the sales by month");
        assert_eq!(c.rule, Some("monthly_revenue"));
    }

    #[test]
    fn test_products_in_country_captures_entity() {
        let c = classify("top 5 products in uk");
        assert_eq!(c.category, Category::Products);
        assert_eq!(c.rule, Some("products_in_country"));
        assert_eq!(c.entity.as_deref(), Some("uk"));

        let c = classify("Top products from the Netherlands?");
        assert_eq!(c.entity.as_deref(), Some("netherlands"));
    }

    #[test]
    fn test_transactions_in_country() {
        let c = classify("show transactions in France");
        assert_eq!(c.category, Category::Transactions);
        assert_eq!(c.rule, Some("transactions_in_country"));
        assert_eq!(c.entity.as_deref(), Some("france"));
    }

    #[test]
    fn test_compare_monthly_takes_precedence() {
        let c = classify("compare monthly revenue france vs germany");
        assert_eq!(c.category, Category::CompareMonthly);
        assert_eq!(c.rule, Some("compare_monthly"));
        assert_eq!(
            c.compared,
            Some(("france".to_string(), "germany".to_string()))
        );
    }

    #[test]
    fn test_compare_total() {
        let c = classify("Compare revenue between Spain and Portugal");
        assert_eq!(c.category, Category::CompareTotal);
        assert_eq!(
            c.compared,
            Some(("spain".to_string(), "portugal".to_string()))
        );

        let c = classify("compare total sales u.k. versus eire");
        assert_eq!(c.category, Category::CompareTotal);
        assert_eq!(c.compared, Some(("u.k".to_string(), "eire".to_string())));
    }

    #[test]
    fn test_compare_without_pair() {
        let c = classify("compare revenue france");
        assert_eq!(c.category, Category::CompareTotal);
        assert_eq!(c.stage, MatchStage::Pattern);
        assert_eq!(c.compared, None);
    }

    #[test]
    fn test_pattern_beats_synonym() {
        // "revenue" and "countries" are both synonyms, but the pattern rule wins
        let c = classify("top 10 countries by revenue");
        assert_eq!(c.stage, MatchStage::Pattern);
        assert_eq!(c.category, Category::Countries);
    }

    #[test]
    fn test_synonym_fallback_and_priority() {
        let c = classify("revenue");
        assert_eq!(c.category, Category::Revenue);
        assert_eq!(c.stage, MatchStage::Synonym);

        let c = classify("how many customers");
        assert_eq!(c.category, Category::Customers);

        // products outranks revenue
        let c = classify("which product has the most sales");
        assert_eq!(c.category, Category::Products);

        // monthly outranks everything
        let c = classify("customers monthly");
        assert_eq!(c.category, Category::MonthlyRevenue);

        // countries outranks customers
        let c = classify("customers per country");
        assert_eq!(c.category, Category::Countries);
    }

    #[test]
    fn test_unresolved() {
        let c = classify("asdkjasd");
        assert_eq!(c.category, Category::Unresolved);
        assert_eq!(c.stage, MatchStage::Unresolved);
        assert_eq!(c.rule, None);
    }

    #[test]
    fn test_substring_false_positive_is_kept() {
        // Known imprecision of the default keyword stage: "borders" contains "orders"
        let c = classify("list of borders");
        assert_eq!(c.category, Category::Transactions);
        assert_eq!(c.stage, MatchStage::Synonym);

        let c = classify("donations");
        assert_eq!(c.category, Category::Countries);
    }

    #[test]
    fn test_word_boundary_mode_diverges_from_substring() {
        let substring = IntentClassifier::new(SynonymMatching::Substring);
        let strict = IntentClassifier::new(SynonymMatching::WordBoundary);

        for query in ["list of borders", "donations"] {
            assert_ne!(substring.classify(query).category, Category::Unresolved);
            let c = strict.classify(query);
            assert_eq!(c.category, Category::Unresolved, "{}", query);
            assert_eq!(c.stage, MatchStage::Unresolved);
        }

        // Whole-word hits still resolve
        assert_eq!(strict.classify("total income?").category, Category::Revenue);
        assert_eq!(strict.classify("open orders").category, Category::Transactions);
    }

    #[test]
    fn test_entity_capture_stops_at_qualifiers() {
        let c = classify("top 5 products in the uk by revenue");
        assert_eq!(c.entity.as_deref(), Some("uk"));

        let c = classify("transactions in france this year");
        assert_eq!(c.entity.as_deref(), Some("france"));

        let c = classify("compare revenue uk vs france please");
        assert_eq!(c.compared, Some(("uk".to_string(), "france".to_string())));

        let c = classify("transactions in united kingdom");
        assert_eq!(c.entity.as_deref(), Some("united kingdom"));
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("per month view", "per month"));
        assert!(!contains_word("borders", "orders"));
        assert!(contains_word("income", "income"));
        assert!(!contains_word("anything", ""));
    }
}
