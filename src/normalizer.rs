//! Entity Normalizer
//!
//! Resolves a free-text entity mention (a country, in practice) to the spelling
//! used as a key in the datasets:
//! 1. static alias table (case and punctuation insensitive)
//! 2. exact, then prefix match against the distinct values observed in the
//!    transactions dataset (loaded at most once per normalizer)
//! 3. optional Jaro-Winkler match against the same observed values
//! 4. title-cased input as a last-resort guess
//!
//! Normalization never fails. Whether the result was recognized is reported by
//! `resolve` through `EntitySource`.

use crate::catalog::{transactions, DatasetKind};
use crate::datasets::{distinct_values, DatasetStore};
use crate::error::Result;
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use strsim::jaro_winkler;
use tracing::{debug, info, warn};

lazy_static! {
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();

    static ref ALIASES: HashMap<String, &'static str> = {
        let groups: &[(&'static str, &[&str])] = &[
            ("United Kingdom", &["uk", "u.k.", "britain", "great britain", "gb", "england", "scotland", "wales"]),
            ("USA", &["us", "u.s.", "u.s.a.", "united states", "united states of america", "america"]),
            ("EIRE", &["ireland", "republic of ireland", "eire"]),
            ("RSA", &["south africa", "rsa"]),
            ("Netherlands", &["holland", "the netherlands", "nl"]),
            ("Germany", &["deutschland", "de"]),
            ("France", &["fr"]),
            ("Spain", &["espana", "españa"]),
            ("Switzerland", &["swiss", "ch"]),
            ("United Arab Emirates", &["uae", "u.a.e.", "emirates"]),
            ("Czech Republic", &["czechia", "czech"]),
            ("Channel Islands", &["jersey", "guernsey"]),
            ("European Community", &["ec", "eu", "european union"]),
        ];

        let mut table = HashMap::new();
        for (canonical, aliases) in groups {
            // Canonical names map to themselves so normalization is idempotent
            table.insert(normalize_key(canonical), *canonical);
            for alias in aliases.iter() {
                table.insert(normalize_key(alias), *canonical);
            }
        }
        table
    };
}

/// Strip punctuation, collapse whitespace, lowercase.
pub fn normalize_key(raw: &str) -> String {
    let stripped: String = raw
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    WHITESPACE.replace_all(stripped.trim(), " ").to_string()
}

pub fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Which stage produced the canonical form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntitySource {
    Alias,
    Observed,
    Fuzzy,
    /// Nothing matched; the canonical form is a title-cased guess
    Unrecognized,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedEntity {
    pub raw: String,
    pub canonical: String,
    pub source: EntitySource,
}

impl ResolvedEntity {
    pub fn is_recognized(&self) -> bool {
        self.source != EntitySource::Unrecognized
    }
}

pub struct EntityNormalizer {
    store: DatasetStore,
    fuzzy_threshold: Option<f64>,
    observed: OnceLock<Vec<String>>,
    loads: AtomicUsize,
}

impl EntityNormalizer {
    pub fn new(store: DatasetStore, fuzzy_threshold: Option<f64>) -> Self {
        Self {
            store,
            fuzzy_threshold,
            observed: OnceLock::new(),
            loads: AtomicUsize::new(0),
        }
    }

    /// Normalizer with a pre-populated observed set; the dataset is never read.
    pub fn with_observed(store: DatasetStore, observed: Vec<String>, fuzzy_threshold: Option<f64>) -> Self {
        let normalizer = Self::new(store, fuzzy_threshold);
        let _ = normalizer.observed.set(observed);
        normalizer
    }

    pub fn normalize(&self, raw: &str) -> String {
        self.resolve(raw).canonical
    }

    pub fn resolve(&self, raw: &str) -> ResolvedEntity {
        let key = normalize_key(raw);
        let resolved = |canonical: String, source: EntitySource| ResolvedEntity {
            raw: raw.to_string(),
            canonical,
            source,
        };

        if key.is_empty() {
            return resolved(String::new(), EntitySource::Unrecognized);
        }

        if let Some(canonical) = ALIASES.get(&key) {
            debug!("Entity '{}' resolved by alias -> {}", raw, canonical);
            return resolved(canonical.to_string(), EntitySource::Alias);
        }

        let observed = self.observed();
        let observed_keys: Vec<(String, &String)> =
            observed.iter().map(|value| (normalize_key(value), value)).collect();

        if let Some((_, value)) = observed_keys.iter().find(|(k, _)| *k == key) {
            return resolved(value.to_string(), EntitySource::Observed);
        }
        if let Some((_, value)) = observed_keys.iter().find(|(k, _)| k.starts_with(&key)) {
            debug!("Entity '{}' resolved by prefix -> {}", raw, value);
            return resolved(value.to_string(), EntitySource::Observed);
        }

        if let Some(threshold) = self.fuzzy_threshold {
            let best = observed_keys
                .iter()
                .map(|(k, value)| (jaro_winkler(&key, k), *value))
                .filter(|(score, _)| *score >= threshold)
                .fold(None::<(f64, &String)>, |best, candidate| match best {
                    Some((score, _)) if score >= candidate.0 => best,
                    _ => Some(candidate),
                });
            if let Some((score, value)) = best {
                debug!("Entity '{}' resolved fuzzily -> {} ({:.2})", raw, value, score);
                return resolved(value.to_string(), EntitySource::Fuzzy);
            }
        }

        debug!("Entity '{}' not recognized, guessing title case", raw);
        resolved(title_case(&key), EntitySource::Unrecognized)
    }

    /// Distinct entity values of the transactions dataset, loaded on first use.
    pub fn observed(&self) -> &[String] {
        self.observed.get_or_init(|| match self.load_observed() {
            Ok(values) => {
                info!("Cached {} observed entities from transactions", values.len());
                values
            }
            Err(e) => {
                warn!("Could not load observed entities, alias table only: {}", e);
                Vec::new()
            }
        })
    }

    /// How many times the observed set has been read from disk.
    pub fn observed_loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    fn load_observed(&self) -> Result<Vec<String>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        let df = self
            .store
            .load_with_columns(DatasetKind::Transactions, &[transactions::COUNTRY])?;
        distinct_values(&df, transactions::COUNTRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatasetFiles;
    use std::fs;

    fn empty_store() -> DatasetStore {
        DatasetStore::new("/nonexistent/retail-qa", DatasetFiles::default())
    }

    fn normalizer(observed: &[&str]) -> EntityNormalizer {
        EntityNormalizer::with_observed(
            empty_store(),
            observed.iter().map(|s| s.to_string()).collect(),
            None,
        )
    }

    #[test]
    fn test_normalize_key() {
        assert_eq!(normalize_key("  U.K. "), "uk");
        assert_eq!(normalize_key("United   Kingdom!"), "united kingdom");
        assert_eq!(normalize_key("Côte d'Ivoire"), "côte divoire");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("united kingdom"), "United Kingdom");
        assert_eq!(title_case("ATLANTIS"), "Atlantis");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_alias_lookup_is_case_and_punctuation_insensitive() {
        let n = normalizer(&[]);
        assert_eq!(n.normalize("U.K."), "United Kingdom");
        assert_eq!(n.normalize("uk"), "United Kingdom");
        assert_eq!(n.normalize("Great Britain"), "United Kingdom");
        assert_eq!(n.normalize("ireland"), "EIRE");
        assert_eq!(n.resolve("uk").source, EntitySource::Alias);
    }

    #[test]
    fn test_alias_normalization_is_idempotent() {
        let n = normalizer(&[]);
        for alias in ALIASES.keys() {
            let once = n.normalize(alias);
            assert_eq!(n.normalize(&once), once, "not idempotent for '{}'", alias);
        }
    }

    #[test]
    fn test_observed_exact_and_prefix() {
        let n = normalizer(&["France", "Germany", "Portugal", "Channel Islands"]);
        assert_eq!(n.normalize("france"), "France");
        assert_eq!(n.normalize("PORT"), "Portugal");
        let resolved = n.resolve("germ");
        assert_eq!(resolved.canonical, "Germany");
        assert_eq!(resolved.source, EntitySource::Observed);
    }

    #[test]
    fn test_unrecognized_falls_back_to_title_case() {
        let n = normalizer(&["France"]);
        let resolved = n.resolve("atlantis");
        assert_eq!(resolved.canonical, "Atlantis");
        assert_eq!(resolved.source, EntitySource::Unrecognized);
        assert!(!resolved.is_recognized());
    }

    #[test]
    fn test_fuzzy_stage_is_opt_in() {
        let observed = vec!["Germany".to_string(), "Greece".to_string()];
        let strict = EntityNormalizer::with_observed(empty_store(), observed.clone(), None);
        assert_eq!(strict.resolve("germny").source, EntitySource::Unrecognized);

        let fuzzy = EntityNormalizer::with_observed(empty_store(), observed, Some(0.85));
        let resolved = fuzzy.resolve("germny");
        assert_eq!(resolved.canonical, "Germany");
        assert_eq!(resolved.source, EntitySource::Fuzzy);
    }

    #[test]
    fn test_empty_input() {
        let n = normalizer(&["France"]);
        assert_eq!(n.normalize("  ?! "), "");
    }

    #[test]
    fn test_observed_set_loads_once() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("transactions.csv"),
            "TransactionID,Country,Revenue\n1,Spain,1.0\n2,Sweden,2.0\n3,Spain,3.0\n",
        )
        .unwrap();
        let n = EntityNormalizer::new(
            DatasetStore::new(dir.path(), DatasetFiles::default()),
            None,
        );

        assert_eq!(n.observed_loads(), 0);
        assert_eq!(n.normalize("swe"), "Sweden");
        assert_eq!(n.normalize("spain"), "Spain");
        assert_eq!(n.observed(), &["Spain".to_string(), "Sweden".to_string()]);
        assert_eq!(n.observed_loads(), 1);
    }

    #[test]
    fn test_missing_transactions_never_fails() {
        let n = EntityNormalizer::new(empty_store(), None);
        assert_eq!(n.normalize("narnia"), "Narnia");
        assert_eq!(n.normalize("narnia"), "Narnia");
        assert_eq!(n.observed_loads(), 1);
        assert!(n.observed().is_empty());
    }
}
