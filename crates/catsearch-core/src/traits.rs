use crate::settings::IndexSettings;
use crate::types::{CatalogEntity, EngineHits, EngineQuery, EntityId, SearchDocument};

/// Full-text engine boundary. Documents are keyed by id; upsert replaces.
pub trait SearchBackend: Send + Sync {
    fn configure(&self, settings: &IndexSettings) -> anyhow::Result<()>;
    fn search(&self, query: &EngineQuery) -> anyhow::Result<EngineHits>;
    fn upsert(&self, docs: &[SearchDocument]) -> anyhow::Result<()>;
    fn delete(&self, id: EntityId) -> anyhow::Result<()>;
    fn clear_all(&self) -> anyhow::Result<()>;
    fn health(&self) -> anyhow::Result<()>;
    fn document_count(&self) -> anyhow::Result<u64>;
}

/// Key-value cache boundary.
pub trait CacheBackend: Send + Sync {
    fn ping(&self) -> anyhow::Result<()>;
    fn get(&self, key: &str) -> anyhow::Result<Option<Vec<u8>>>;
    /// Store only if the key is absent (or expired). Returns whether it was written.
    fn set_if_absent(&self, key: &str, value: &[u8], ttl_secs: u64) -> anyhow::Result<bool>;
    /// Returns the number of keys removed.
    fn delete_by_prefix(&self, prefix: &str) -> anyhow::Result<usize>;
}

/// Pull access to published catalog entities in a stable order.
pub trait CatalogSource: Send + Sync {
    fn count(&self) -> anyhow::Result<usize>;
    fn page(&self, offset: usize, limit: usize) -> anyhow::Result<Vec<CatalogEntity>>;
}
