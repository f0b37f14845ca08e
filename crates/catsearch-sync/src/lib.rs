//! catsearch-sync
//!
//! Keeps the engine's documents in step with the catalog: per-entity change
//! events, full reindex, and an externally driven batch step for progress UIs.

pub mod catalog;
mod synchronizer;

pub use catalog::JsonCatalog;
pub use synchronizer::{BatchProgress, IndexSynchronizer, ReindexReport, DEFAULT_BATCH_SIZE};
