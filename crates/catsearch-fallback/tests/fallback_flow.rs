use std::sync::{Arc, Mutex};

use catsearch_core::config::SearchConfig;
use catsearch_core::document::DocumentBuilder;
use catsearch_core::settings::{fields, IndexSettings};
use catsearch_core::traits::SearchBackend;
use catsearch_core::types::{
    CatalogEntity, EngineHits, EngineQuery, EntityId, FallbackLayer, ResultField, SearchDocument, SearchFilter,
    SearchOptions, StockStatus,
};
use catsearch_fallback::FallbackSearcher;
use catsearch_gateway::{CacheGateway, EngineGateway, MemoryCache};
use catsearch_text::TantivyBackend;

/// Tantivy backend that records every query it receives.
struct Recording {
    inner: TantivyBackend,
    queries: Mutex<Vec<EngineQuery>>,
}

impl Recording {
    fn seeded() -> Self {
        let inner = TantivyBackend::in_ram(20_000_000).expect("backend");
        let mut malbec = CatalogEntity::new(1, "Santa Julia Malbec").with_categories(["Vinos", "Tintos"]);
        malbec.price = 39.9;
        malbec.image_url = "https://cdn.example/sjm.jpg".into();
        let mut cabernet = CatalogEntity::new(2, "Catena Cabernet Sauvignon").with_categories(["Vinos"]);
        cabernet.stock_status = StockStatus::OutOfStock;
        let glass = CatalogEntity::new(3, "Copa Malbec Riedel").with_categories(["Accesorios"]);
        inner.upsert(&DocumentBuilder::default().build_all(&[malbec, cabernet, glass])).expect("upsert");
        Self { inner, queries: Mutex::new(Vec::new()) }
    }

    fn issued(&self) -> Vec<EngineQuery> {
        self.queries.lock().expect("lock").clone()
    }

    fn reset(&self) {
        self.queries.lock().expect("lock").clear();
    }
}

impl SearchBackend for Recording {
    fn configure(&self, settings: &IndexSettings) -> anyhow::Result<()> { self.inner.configure(settings) }
    fn search(&self, query: &EngineQuery) -> anyhow::Result<EngineHits> {
        self.queries.lock().expect("lock").push(query.clone());
        self.inner.search(query)
    }
    fn upsert(&self, docs: &[SearchDocument]) -> anyhow::Result<()> { self.inner.upsert(docs) }
    fn delete(&self, id: EntityId) -> anyhow::Result<()> { self.inner.delete(id) }
    fn clear_all(&self) -> anyhow::Result<()> { self.inner.clear_all() }
    fn health(&self) -> anyhow::Result<()> { self.inner.health() }
    fn document_count(&self) -> anyhow::Result<u64> { self.inner.document_count() }
}

fn setup() -> (Arc<Recording>, FallbackSearcher) {
    let backend = Arc::new(Recording::seeded());
    let cache = Arc::new(CacheGateway::connect(Box::new(MemoryCache::new()), "test:search:", 300));
    let engine = Arc::new(EngineGateway::new(backend.clone(), cache, 100));
    assert!(engine.configure(&IndexSettings::default()));
    (backend, FallbackSearcher::new(engine, SearchConfig::default()))
}

fn ids(response: &catsearch_core::types::SearchResponse) -> Vec<u64> {
    response.results.iter().map(|r| r.id).collect()
}

#[test]
fn direct_hit_short_circuits() {
    let (backend, searcher) = setup();
    let response = searcher.search("santa julia", &SearchOptions::default());
    assert_eq!(ids(&response), vec![1]);
    assert_eq!(response.fallback, None);
    assert!(!response.cached);
    let issued = backend.issued();
    assert_eq!(issued.len(), 1);
    assert_eq!(issued[0].searchable_override, None);
}

#[test]
fn compound_query_is_answered_by_split() {
    let (backend, searcher) = setup();
    let response = searcher.search("santajullia", &SearchOptions::default());
    assert_eq!(ids(&response), vec![1]);
    assert_eq!(response.fallback, Some(FallbackLayer::Split));
    let issued: Vec<String> = backend.issued().into_iter().map(|q| q.q).collect();
    // direct, then splits in order until the first that matches
    assert_eq!(issued, vec!["santajullia", "sant ajullia", "santa jullia"]);
}

#[test]
fn first_character_typo_is_answered_by_alternate_field() {
    let (backend, searcher) = setup();
    let response = searcher.search("zanta jul", &SearchOptions::default());
    assert_eq!(ids(&response), vec![1]);
    assert_eq!(response.fallback, Some(FallbackLayer::FirstCharStrip));
    let issued = backend.issued();
    assert_eq!(issued.len(), 2, "no split candidates for short tokens");
    assert_eq!(issued[1].q, "anta ul");
    assert_eq!(issued[1].searchable_override, Some(vec![fields::NAME_ALT.to_string()]));
}

#[test]
fn nothing_to_strip_skips_alternate_layer() {
    let (backend, searcher) = setup();
    let response = searcher.search("zq xy", &SearchOptions::default());
    assert!(response.is_empty());
    assert_eq!(response.fallback, None);
    assert_eq!(backend.issued().len(), 1);
}

#[test]
fn misses_end_empty_after_all_layers() {
    let (backend, searcher) = setup();
    let response = searcher.search("zzzzzzzzzz", &SearchOptions::default());
    assert!(response.is_empty());
    assert!(!response.cached);
    assert_eq!(response.fallback, None);
    // direct + three splits + alternate
    assert_eq!(backend.issued().len(), 5);
}

#[test]
fn repeated_query_hits_cache_until_mutation() {
    let (backend, searcher) = setup();
    let options = SearchOptions::default();

    let first = searcher.search("malbec", &options);
    assert!(!first.cached);
    assert_eq!(ids(&first), vec![1, 3]);

    backend.reset();
    let second = searcher.search("malbec", &options);
    assert!(second.cached);
    assert_eq!(second.results, first.results);
    assert!(backend.issued().is_empty());

    let doc = DocumentBuilder::default().build(&CatalogEntity::new(7, "Alamos Malbec"));
    assert!(searcher.engine().upsert(&[doc]));
    let third = searcher.search("malbec", &options);
    assert!(!third.cached);
    assert_eq!(third.results.len(), 3);

    assert!(searcher.engine().delete(7));
    assert!(!searcher.search("malbec", &options).cached);
}

#[test]
fn cached_fallback_keeps_its_tag() {
    let (_backend, searcher) = setup();
    searcher.search("santajullia", &SearchOptions::default());
    let again = searcher.search("santajullia", &SearchOptions::default());
    assert!(again.cached);
    assert_eq!(again.fallback, Some(FallbackLayer::Split));
}

#[test]
fn empty_results_are_not_cached() {
    let (backend, searcher) = setup();
    searcher.search("zzzzzz", &SearchOptions::default());
    backend.reset();
    let again = searcher.search("zzzzzz", &SearchOptions::default());
    assert!(!again.cached);
    assert!(!backend.issued().is_empty());
}

#[test]
fn options_are_part_of_the_cache_key() {
    let (_backend, searcher) = setup();
    assert!(!searcher.search("malbec", &SearchOptions::default()).cached);
    assert!(!searcher.search("malbec", &SearchOptions::with_limit(1)).cached);
    assert!(searcher.search("malbec", &SearchOptions::with_limit(1)).cached);
}

#[test]
fn projection_and_filters_apply() {
    let (_backend, searcher) = setup();
    let options = SearchOptions {
        limit: 10,
        fields: Some(vec![ResultField::Name]),
        filter: SearchFilter { in_stock_only: true, category: Some("Vinos".into()) },
    };
    let response = searcher.search("malbec", &options);
    assert_eq!(ids(&response), vec![1]);
    let item = &response.results[0];
    assert_eq!(item.name.as_deref(), Some("Santa Julia Malbec"));
    assert_eq!(item.price, None);
    assert_eq!(item.image, None);

    let out_of_stock = searcher.search("catena", &SearchOptions {
        filter: SearchFilter { in_stock_only: true, category: None },
        ..SearchOptions::default()
    });
    assert!(out_of_stock.is_empty());
}

#[test]
fn raw_queries_are_trimmed_and_bounded() {
    let (backend, searcher) = setup();
    assert!(searcher.search_raw("  m ", SearchOptions::default()).is_empty());
    assert!(backend.issued().is_empty(), "short queries never reach the engine");

    let response = searcher.search_raw("  malbec  ", SearchOptions::with_limit(1000));
    assert_eq!(ids(&response), vec![1, 3]);
    assert_eq!(backend.issued()[0].limit, 100);

    backend.reset();
    searcher.search_raw("cabernet", SearchOptions::with_limit(0));
    assert_eq!(backend.issued()[0].limit, 20);
}
