//! Intent resolution
//!
//! Classification of a raw query into a `Category`, plus extraction of the
//! secondary parameters (top-N, entity mentions) the handlers need.

pub mod classifier;
pub mod params;

pub use classifier::{Classification, IntentClassifier, SynonymMatching};
pub use params::{extract_entity_mention, extract_top_n, QueryParameters};
