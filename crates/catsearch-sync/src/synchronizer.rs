use std::sync::Arc;
use tracing::{debug, info, warn};

use catsearch_core::document::DocumentBuilder;
use catsearch_core::error::{Error, Result};
use catsearch_core::traits::CatalogSource;
use catsearch_core::types::{CatalogEntity, CatalogEvent, SearchDocument};
use catsearch_gateway::EngineGateway;

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Outcome of one batch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Documents upserted by this step.
    pub indexed: usize,
    /// Offset to pass to the next step.
    pub next_offset: usize,
    /// Catalog size when the step ran.
    pub total: usize,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReindexReport {
    pub indexed: usize,
    pub batches: usize,
}

pub struct IndexSynchronizer<C: CatalogSource> {
    catalog: C,
    engine: Arc<EngineGateway>,
    builder: DocumentBuilder,
    batch_size: usize,
}

impl<C: CatalogSource> IndexSynchronizer<C> {
    pub fn new(catalog: C, engine: Arc<EngineGateway>, builder: DocumentBuilder) -> Self {
        Self { catalog, engine, builder, batch_size: DEFAULT_BATCH_SIZE }
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Apply one catalog change. Published entities are (re)upserted in full;
    /// unpublished or deleted ones lose their document. Returns whether the
    /// engine accepted the change.
    pub fn handle(&self, event: CatalogEvent) -> bool {
        match event {
            CatalogEvent::Created(entity) | CatalogEvent::Updated(entity) => self.sync_entity(&entity),
            CatalogEvent::Unpublished(id) | CatalogEvent::Deleted(id) => {
                debug!(id, "removing document");
                self.engine.delete(id)
            }
        }
    }

    fn sync_entity(&self, entity: &CatalogEntity) -> bool {
        if !entity.published {
            debug!(id = entity.id, "entity not published, removing document");
            return self.engine.delete(entity.id);
        }
        self.engine.upsert(&[self.builder.build(entity)])
    }

    /// One step of a resumable reindex. Offset 0 clears the index first, so a
    /// restarted run never leaves orphaned documents behind.
    pub fn reindex_batch(&self, offset: usize) -> Result<BatchProgress> {
        if offset == 0 && !self.engine.clear_all() {
            return Err(Error::EngineUnavailable("could not clear index before reindex".into()));
        }
        let total = self.catalog.count().map_err(|e| Error::Catalog(e.to_string()))?;
        let page = self.catalog.page(offset, self.batch_size).map_err(|e| Error::Catalog(e.to_string()))?;
        let next_offset = offset + page.len();

        let docs: Vec<SearchDocument> = page.iter().filter(|e| e.published).map(|e| self.builder.build(e)).collect();
        if !docs.is_empty() && !self.engine.upsert(&docs) {
            warn!(offset, size = docs.len(), "batch upsert failed");
            return Err(Error::EngineUnavailable(format!("batch at offset {} was not indexed", offset)));
        }
        let progress = BatchProgress { indexed: docs.len(), next_offset, total, done: page.is_empty() || next_offset >= total };
        debug!(offset, indexed = progress.indexed, total, done = progress.done, "reindex batch");
        Ok(progress)
    }

    /// Clear the index and rebuild it from the whole catalog.
    pub fn reindex_all(&self) -> Result<ReindexReport> {
        let mut report = ReindexReport::default();
        let mut offset = 0;
        loop {
            let progress = self.reindex_batch(offset)?;
            report.indexed += progress.indexed;
            report.batches += 1;
            if progress.done {
                break;
            }
            offset = progress.next_offset;
        }
        info!(indexed = report.indexed, batches = report.batches, "reindex complete");
        Ok(report)
    }
}
