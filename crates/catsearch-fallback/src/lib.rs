//! catsearch-fallback
//!
//! Layered search: a direct query, then compound-split candidates, then the
//! first-character-stripped query against `name_alt`. The first non-empty
//! layer answers and non-empty answers are cached.

mod orchestrator;
pub mod split;

pub use orchestrator::FallbackSearcher;
pub use split::split_candidates;
