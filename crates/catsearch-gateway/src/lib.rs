//! catsearch-gateway
//!
//! Fail-open wrappers around the two external collaborators on the query path:
//! the full-text engine and the key-value cache. Nothing below this boundary
//! surfaces an error to callers; failures degrade to empty results, cache
//! misses and logged no-ops.
pub mod cache;
pub mod engine;

pub use cache::{CacheGateway, MemoryCache, RedisCache};
pub use engine::EngineGateway;
