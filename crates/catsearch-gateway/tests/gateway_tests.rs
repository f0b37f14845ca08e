use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use catsearch_core::document::DocumentBuilder;
use catsearch_core::settings::IndexSettings;
use catsearch_core::traits::{CacheBackend, SearchBackend};
use catsearch_core::types::{CatalogEntity, EngineHits, EngineQuery, EntityId, SearchDocument, SearchOptions};
use catsearch_gateway::{CacheGateway, EngineGateway, MemoryCache};
use catsearch_text::TantivyBackend;

/// Cache whose every operation fails, optionally after a successful ping.
struct BrokenCache {
    ping_ok: bool,
    calls: Arc<AtomicUsize>,
}

impl CacheBackend for BrokenCache {
    fn ping(&self) -> anyhow::Result<()> {
        if self.ping_ok { Ok(()) } else { anyhow::bail!("connection refused") }
    }
    fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("timeout")
    }
    fn set_if_absent(&self, _key: &str, _value: &[u8], _ttl_secs: u64) -> anyhow::Result<bool> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("timeout")
    }
    fn delete_by_prefix(&self, _prefix: &str) -> anyhow::Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("timeout")
    }
}

struct DownEngine;

impl SearchBackend for DownEngine {
    fn configure(&self, _settings: &IndexSettings) -> anyhow::Result<()> { anyhow::bail!("engine down") }
    fn search(&self, _query: &EngineQuery) -> anyhow::Result<EngineHits> { anyhow::bail!("engine down") }
    fn upsert(&self, _docs: &[SearchDocument]) -> anyhow::Result<()> { anyhow::bail!("engine down") }
    fn delete(&self, _id: EntityId) -> anyhow::Result<()> { anyhow::bail!("engine down") }
    fn clear_all(&self) -> anyhow::Result<()> { anyhow::bail!("engine down") }
    fn health(&self) -> anyhow::Result<()> { anyhow::bail!("engine down") }
    fn document_count(&self) -> anyhow::Result<u64> { anyhow::bail!("engine down") }
}

fn memory_gateway() -> Arc<CacheGateway> {
    Arc::new(CacheGateway::connect(Box::new(MemoryCache::new()), "test:", 300))
}

#[test]
fn cache_round_trip_and_set_if_absent() {
    let cache = memory_gateway();
    assert!(cache.is_enabled());
    assert_eq!(cache.get("test:a"), None);
    cache.set_if_absent_or_expired("test:a", b"first", 300);
    cache.set_if_absent_or_expired("test:a", b"second", 300);
    assert_eq!(cache.get("test:a").as_deref(), Some(&b"first"[..]));
}

#[test]
fn expired_entries_are_replaced() {
    let backend = MemoryCache::new();
    assert!(backend.set_if_absent("k", b"old", 0).expect("set"));
    assert_eq!(backend.get("k").expect("get"), None);
    assert!(backend.set_if_absent("k", b"new", 60).expect("set"));
    assert_eq!(backend.get("k").expect("get"), Some(b"new".to_vec()));
}

#[test]
fn expired_entries_are_pruned_on_write() {
    let backend = MemoryCache::new();
    assert!(backend.is_empty());
    assert!(backend.set_if_absent("live", b"keep", 600).expect("set"));
    for i in 0..1000 {
        backend.set_if_absent(&format!("short:{}", i), b"x", 0).expect("set");
    }
    // only the live entry and the last short-lived one can remain
    assert!(backend.len() <= 2);
    assert_eq!(backend.get("live").expect("get"), Some(b"keep".to_vec()));
    assert!(backend.delete_by_prefix("short:").expect("delete") <= 1);
    assert_eq!(backend.len(), 1);
}

#[test]
fn invalidation_is_scoped_to_prefix() {
    let cache = memory_gateway();
    cache.set_if_absent_or_expired("test:a", b"1", 300);
    cache.set_if_absent_or_expired("other:b", b"2", 300);
    cache.invalidate_all();
    assert_eq!(cache.get("test:a"), None);
    assert_eq!(cache.get("other:b").as_deref(), Some(&b"2"[..]));
}

#[test]
fn key_depends_on_query_and_options() {
    let cache = memory_gateway();
    let opts = SearchOptions::default();
    let key = cache.key_for("malbec", &opts);
    assert!(key.starts_with("test:"));
    assert_eq!(key, cache.key_for("malbec", &opts));
    assert_ne!(key, cache.key_for("malbek", &opts));
    assert_ne!(key, cache.key_for("malbec", &SearchOptions::with_limit(5)));
}

#[test]
fn unreachable_cache_disables_itself_at_startup() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = CacheGateway::connect(Box::new(BrokenCache { ping_ok: false, calls: calls.clone() }), "test:", 300);
    assert!(!cache.is_enabled());
    cache.set_if_absent_or_expired("test:a", b"1", 300);
    assert_eq!(cache.get("test:a"), None);
    cache.invalidate_all();
    assert_eq!(calls.load(Ordering::SeqCst), 0, "a disabled gateway never touches the backend");
}

#[test]
fn runtime_cache_failures_are_misses() {
    let calls = Arc::new(AtomicUsize::new(0));
    let cache = CacheGateway::connect(Box::new(BrokenCache { ping_ok: true, calls: calls.clone() }), "test:", 300);
    assert!(cache.is_enabled());
    assert_eq!(cache.get("test:a"), None);
    cache.set_if_absent_or_expired("test:a", b"1", 300);
    cache.invalidate_all();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[test]
fn json_helpers_ignore_garbage() {
    let cache = memory_gateway();
    cache.set_if_absent_or_expired("test:bad", b"not json", 300);
    assert_eq!(cache.get_json::<Vec<u32>>("test:bad"), None);
    cache.put_json("test:good", &vec![1u32, 2, 3]);
    assert_eq!(cache.get_json::<Vec<u32>>("test:good"), Some(vec![1, 2, 3]));
}

#[test]
fn engine_failures_never_escape() {
    let engine = EngineGateway::new(Arc::new(DownEngine), memory_gateway(), 50);
    let hits = engine.search(&EngineQuery::new("malbec", 10));
    assert!(hits.items.is_empty());
    assert_eq!(hits.processing_time_ms, 0);
    assert!(!engine.upsert(&[]));
    assert!(!engine.delete(1));
    assert!(!engine.clear_all());
    assert!(!engine.configure(&IndexSettings::default()));
    assert!(!engine.health());
    assert_eq!(engine.document_count(), None);
}

#[test]
fn failed_mutation_keeps_cache() {
    let cache = memory_gateway();
    cache.set_if_absent_or_expired("test:a", b"1", 300);
    let engine = EngineGateway::new(Arc::new(DownEngine), cache.clone(), 50);
    engine.delete(1);
    assert!(cache.get("test:a").is_some());
}

#[test]
fn successful_mutations_invalidate_cache() {
    let cache = memory_gateway();
    let backend = Arc::new(TantivyBackend::in_ram(20_000_000).expect("backend"));
    let engine = EngineGateway::new(backend, cache.clone(), 50);

    cache.set_if_absent_or_expired("test:a", b"1", 300);
    let doc = DocumentBuilder::default().build(&CatalogEntity::new(9, "Tabernero Borgoña"));
    assert!(engine.upsert(&[doc]));
    assert_eq!(cache.get("test:a"), None);

    cache.set_if_absent_or_expired("test:a", b"1", 300);
    assert!(engine.delete(9));
    assert_eq!(cache.get("test:a"), None);
    assert!(engine.health());
}

#[test]
fn limit_is_clamped_to_ceiling() {
    let backend = Arc::new(TantivyBackend::in_ram(20_000_000).expect("backend"));
    let engine = EngineGateway::new(backend, Arc::new(CacheGateway::disabled("test:")), 2);
    let docs: Vec<_> = (1..=5).map(|i| DocumentBuilder::default().build(&CatalogEntity::new(i, format!("Malbec {}", i)))).collect();
    assert!(engine.upsert(&docs));
    assert_eq!(engine.search(&EngineQuery::new("malbec", 100)).items.len(), 2);
}

#[test]
fn rejected_configuration_is_not_fatal() {
    let backend = Arc::new(TantivyBackend::in_ram(20_000_000).expect("backend"));
    let engine = EngineGateway::new(backend, memory_gateway(), 50);
    let mut bad = IndexSettings::default();
    bad.sortable.push("description".into());
    assert!(!engine.configure(&bad));
    assert!(engine.configure(&IndexSettings::default()));
}
