//! Parameter Extractor
//!
//! Category-independent parameters pulled out of the raw query text.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TOP_N: Regex = Regex::new(r"\btop\s+(\d+)\b").unwrap();
    static ref ENTITY_MENTION: Regex =
        Regex::new(r"\b(?:in|from|for)\s+([a-z][a-z\s.'&-]*)").unwrap();
    static ref LEADING_THE: Regex = Regex::new(r"^the(?:\s+|$)").unwrap();
    static ref TRAILING_QUALIFIER: Regex = Regex::new(
        r"(?:^|\s+)(?:by|this|last|next|with|please|per|during|since|over|in|on|at|from)\b.*$"
    )
    .unwrap();
}

/// Parameters shared by every handler.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryParameters {
    pub top_n: usize,
    /// Raw entity mention, before normalization
    pub entity: Option<String>,
    /// Raw comparison pair, before normalization
    pub compared: Option<(String, String)>,
}

/// The integer following "top", when present and positive; otherwise `default`.
pub fn extract_top_n(query: &str, default: usize) -> usize {
    let q = query.to_lowercase();
    TOP_N
        .captures(&q)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(default)
}

/// First "in X" / "from X" / "for X" phrase, trimmed, with a leading "the" removed.
pub fn extract_entity_mention(query: &str) -> Option<String> {
    let q = query.to_lowercase();
    let caps = ENTITY_MENTION.captures(&q)?;
    let phrase = strip_qualifiers(caps.get(1)?.as_str());
    let phrase = phrase.trim();
    let phrase = phrase.trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    let phrase = LEADING_THE.replace(phrase, "");
    let phrase = phrase.trim();
    if phrase.is_empty() {
        None
    } else {
        Some(phrase.to_string())
    }
}

/// Cut an entity phrase at the first trailing qualifier ("by revenue",
/// "this year", "please").
pub(crate) fn strip_qualifiers(phrase: &str) -> String {
    TRAILING_QUALIFIER.replace(phrase, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_present() {
        assert_eq!(extract_top_n("top 3 countries", 5), 3);
        assert_eq!(extract_top_n("Show me the TOP 12 products in uk", 5), 12);
        assert_eq!(extract_top_n("top   7 products", 5), 7);
    }

    #[test]
    fn test_top_n_default() {
        assert_eq!(extract_top_n("top countries", 5), 5);
        assert_eq!(extract_top_n("revenue by country", 5), 5);
        assert_eq!(extract_top_n("top 0 countries", 5), 5);
        assert_eq!(extract_top_n("top -2 countries", 4), 4);
        assert_eq!(extract_top_n("top 99999999999999999999999 countries", 5), 5);
    }

    #[test]
    fn test_entity_mention() {
        assert_eq!(
            extract_entity_mention("revenue in United Kingdom"),
            Some("united kingdom".to_string())
        );
        assert_eq!(
            extract_entity_mention("sales from the netherlands"),
            Some("netherlands".to_string())
        );
        assert_eq!(extract_entity_mention("revenue for EIRE?"), Some("eire".to_string()));
        assert_eq!(extract_entity_mention("total revenue"), None);
    }

    #[test]
    fn test_entity_mention_ignores_embedded_prepositions() {
        // "in" inside "income" or "info" must not count
        assert_eq!(extract_entity_mention("income info"), None);
        assert_eq!(extract_entity_mention("for the"), None);
    }

    #[test]
    fn test_entity_mention_drops_trailing_qualifiers() {
        assert_eq!(
            extract_entity_mention("revenue for france this year"),
            Some("france".to_string())
        );
        assert_eq!(
            extract_entity_mention("revenue in the uk by month, please"),
            Some("uk".to_string())
        );
        assert_eq!(extract_entity_mention("revenue for this year"), None);
        assert_eq!(strip_qualifiers("united kingdom"), "united kingdom");
    }
}
