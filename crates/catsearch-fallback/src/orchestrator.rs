use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use catsearch_core::alt_name::alternate_query;
use catsearch_core::config::SearchConfig;
use catsearch_core::settings::fields;
use catsearch_core::types::{
    CachedResponse, EngineHits, EngineQuery, FallbackLayer, SearchOptions, SearchResponse, SearchResultItem,
};
use catsearch_gateway::EngineGateway;

use crate::split::split_candidates;

/// Entry point for queries. Stateless per call; layers run sequentially and
/// short-circuit on the first non-empty result set.
pub struct FallbackSearcher {
    engine: Arc<EngineGateway>,
    config: SearchConfig,
}

impl FallbackSearcher {
    pub fn new(engine: Arc<EngineGateway>, config: SearchConfig) -> Self {
        Self { engine, config }
    }

    pub fn engine(&self) -> &Arc<EngineGateway> {
        &self.engine
    }

    /// Public query contract: trims `raw`, answers "no results" below the
    /// minimum length and bounds the limit by the configured ceiling.
    /// A zero limit means the configured default.
    pub fn search_raw(&self, raw: &str, mut options: SearchOptions) -> SearchResponse {
        let started = Instant::now();
        let query = raw.trim();
        if query.chars().count() < self.config.min_query_len {
            debug!(query = %query, min = self.config.min_query_len, "query too short");
            return SearchResponse::empty(elapsed_ms(started));
        }
        if options.limit == 0 {
            options.limit = self.config.default_limit;
        }
        options.limit = options.limit.min(self.config.max_limit);
        self.search(query, &options)
    }

    /// Run the cached, layered search for an already-validated query.
    pub fn search(&self, query: &str, options: &SearchOptions) -> SearchResponse {
        let started = Instant::now();
        let cache = self.engine.cache();
        let key = cache.key_for(query, options);
        if let Some(hit) = cache.get_json::<CachedResponse>(&key) {
            debug!(query = %query, "cache hit");
            return hit.into_hit();
        }

        let Some((layer, hits)) = self.resolve(query, options) else {
            debug!(query = %query, "no layer matched");
            return SearchResponse::empty(elapsed_ms(started));
        };

        let results: Vec<SearchResultItem> = match &options.fields {
            Some(projection) => hits.items.into_iter().map(|item| item.project(projection)).collect(),
            None => hits.items,
        };
        let response = SearchResponse { results, processing_time_ms: elapsed_ms(started), cached: false, fallback: layer };
        cache.put_json(&key, &CachedResponse::from(&response));
        response
    }

    /// The first layer yielding hits, tagged with the fallback that produced it
    /// (`None` for the direct search).
    fn resolve(&self, query: &str, options: &SearchOptions) -> Option<(Option<FallbackLayer>, EngineHits)> {
        let direct = self.run(EngineQuery::new(query, options.limit), options);
        if !direct.items.is_empty() {
            debug!(query = %query, hits = direct.items.len(), "direct match");
            return Some((None, direct));
        }

        for candidate in split_candidates(query) {
            let hits = self.run(EngineQuery::new(candidate.as_str(), options.limit), options);
            if !hits.items.is_empty() {
                debug!(query = %query, candidate = %candidate, layer = ?FallbackLayer::Split, "fallback match");
                return Some((Some(FallbackLayer::Split), hits));
            }
        }

        let alternate = alternate_query(query).filter(|alt| !alt.is_empty())?;
        let hits = self.run(EngineQuery::new(alternate.as_str(), options.limit).restricted_to(&[fields::NAME_ALT]), options);
        if hits.items.is_empty() {
            return None;
        }
        debug!(query = %query, alternate = %alternate, layer = ?FallbackLayer::FirstCharStrip, "fallback match");
        Some((Some(FallbackLayer::FirstCharStrip), hits))
    }

    fn run(&self, query: EngineQuery, options: &SearchOptions) -> EngineHits {
        self.engine.search(&query.with_filter(options.filter.clone()))
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
