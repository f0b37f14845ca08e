use std::sync::Arc;
use tracing::{debug, info, warn};

use catsearch_core::error::Error;
use catsearch_core::settings::IndexSettings;
use catsearch_core::traits::SearchBackend;
use catsearch_core::types::{EngineHits, EngineQuery, EntityId, SearchDocument};

use crate::cache::CacheGateway;

/// Query execution and index mutation against the full-text engine.
///
/// `search` never fails: engine errors become an empty hit list with zero
/// timing. Mutations log failures and invalidate the result cache on success.
pub struct EngineGateway {
    backend: Arc<dyn SearchBackend>,
    cache: Arc<CacheGateway>,
    max_limit: usize,
}

impl EngineGateway {
    pub fn new(backend: Arc<dyn SearchBackend>, cache: Arc<CacheGateway>, max_limit: usize) -> Self {
        Self { backend, cache, max_limit: max_limit.max(1) }
    }

    pub fn cache(&self) -> &Arc<CacheGateway> {
        &self.cache
    }

    /// Apply field and ranking settings. A rejected configuration is logged and
    /// the engine keeps whatever it had before.
    pub fn configure(&self, settings: &IndexSettings) -> bool {
        match self.backend.configure(settings) {
            Ok(()) => {
                info!(searchable = ?settings.searchable, ranking = ?settings.ranking_rules, "index configured");
                true
            }
            Err(e) => {
                let err = Error::IndexConfiguration(e.to_string());
                warn!(error = %err, "keeping previous index configuration");
                false
            }
        }
    }

    pub fn search(&self, query: &EngineQuery) -> EngineHits {
        let mut bounded = query.clone();
        bounded.limit = bounded.limit.min(self.max_limit);
        match self.backend.search(&bounded) {
            Ok(hits) => {
                debug!(query = %bounded.q, fields = ?bounded.searchable_override, hits = hits.items.len(), "engine search");
                hits
            }
            Err(e) => {
                let err = Error::EngineUnavailable(e.to_string());
                warn!(query = %bounded.q, error = %err, "search failed, returning no results");
                EngineHits::default()
            }
        }
    }

    pub fn upsert(&self, docs: &[SearchDocument]) -> bool {
        self.mutate("upsert", || self.backend.upsert(docs))
    }

    pub fn delete(&self, id: EntityId) -> bool {
        self.mutate("delete", || self.backend.delete(id))
    }

    pub fn clear_all(&self) -> bool {
        self.mutate("clear", || self.backend.clear_all())
    }

    pub fn health(&self) -> bool {
        self.backend.health().is_ok()
    }

    pub fn document_count(&self) -> Option<u64> {
        self.backend.document_count().ok()
    }

    fn mutate(&self, op: &str, f: impl FnOnce() -> anyhow::Result<()>) -> bool {
        match f() {
            Ok(()) => {
                self.cache.invalidate_all();
                true
            }
            Err(e) => {
                let err = Error::EngineUnavailable(e.to_string());
                warn!(op, error = %err, "index mutation failed");
                false
            }
        }
    }
}
