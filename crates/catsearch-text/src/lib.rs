//! catsearch-text
//!
//! Embedded full-text engine over Tantivy. Typo tolerance follows the hosted
//! engine it stands in for: per-word typo budgets by length, prefix matching on
//! the last query word, and no correction of a word's first character.
pub mod tantivy_utils;
pub mod index;
pub mod search;

pub use index::TantivyBackend;
