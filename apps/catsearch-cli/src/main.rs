mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::prelude::*;

use catsearch_core::config::{expand_path, CacheBackendKind, Config, Settings};
use catsearch_core::document::{DocumentBuilder, PriorityClassifier};
use catsearch_core::settings::IndexSettings;
use catsearch_core::traits::SearchBackend;
use catsearch_core::types::{CatalogEvent, ResultField, SearchFilter, SearchOptions};
use catsearch_fallback::FallbackSearcher;
use catsearch_gateway::{CacheGateway, EngineGateway, MemoryCache, RedisCache};
use catsearch_sync::{IndexSynchronizer, JsonCatalog};
use catsearch_text::TantivyBackend;
use cli::{Cli, Commands, EventArg};

#[derive(Serialize)]
struct HealthReport {
    engine: bool,
    documents: Option<u64>,
    cache: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = config.settings()?;
    let index_dir = if cli.in_memory {
        None
    } else {
        cli.index_dir.clone().or_else(|| settings.engine.index_dir.as_deref().map(expand_path))
    };
    let engine = build_engine(&settings, index_dir)?;

    match cli.command {
        Commands::Reindex => {
            let sync = synchronizer(&settings, cli.catalog, engine)?;
            reindex(&sync)?;
        }
        Commands::Search { query, limit, in_stock, category, fields } => {
            let searcher = FallbackSearcher::new(engine, settings.search.clone());
            let options = SearchOptions {
                limit: limit.unwrap_or(settings.search.default_limit),
                fields: (!fields.is_empty()).then(|| fields.into_iter().map(ResultField::from).collect()),
                filter: SearchFilter { in_stock_only: in_stock, category },
            };
            print_json(&searcher.search_raw(&query, options))?;
        }
        Commands::Sync { event, id } => {
            let sync = synchronizer(&settings, cli.catalog, engine)?;
            let event = match event {
                EventArg::Created => CatalogEvent::Created(sync.catalog().get(id)?.clone()),
                EventArg::Updated => CatalogEvent::Updated(sync.catalog().get(id)?.clone()),
                EventArg::Unpublished => CatalogEvent::Unpublished(id),
                EventArg::Deleted => CatalogEvent::Deleted(id),
            };
            if !sync.handle(event) {
                anyhow::bail!("engine rejected the change for entity {}", id);
            }
            println!("✅ entity {} synced", id);
        }
        Commands::Health => {
            let report = HealthReport { engine: engine.health(), documents: engine.document_count(), cache: engine.cache().is_enabled() };
            print_json(&report)?;
        }
    }
    Ok(())
}

fn build_engine(settings: &Settings, index_dir: Option<PathBuf>) -> Result<Arc<EngineGateway>> {
    let memory = settings.engine.writer_memory_bytes;
    let backend: Arc<dyn SearchBackend> = match index_dir {
        Some(dir) => Arc::new(
            TantivyBackend::open_or_create(&dir, memory).with_context(|| format!("opening index at {}", dir.display()))?,
        ),
        None => {
            tracing::warn!("using an in-memory index, nothing is persisted");
            Arc::new(TantivyBackend::in_ram(memory)?)
        }
    };

    let cache_cfg = &settings.cache;
    let cache = match (cache_cfg.backend, cache_cfg.url.as_deref()) {
        (CacheBackendKind::Redis, Some(url)) => {
            let redis = RedisCache::open(url, Duration::from_millis(cache_cfg.timeout_ms))?;
            CacheGateway::connect(Box::new(redis), cache_cfg.prefix.clone(), cache_cfg.ttl_secs)
        }
        (CacheBackendKind::Memory, _) => {
            CacheGateway::connect(Box::new(MemoryCache::new()), cache_cfg.prefix.clone(), cache_cfg.ttl_secs)
        }
        _ => CacheGateway::disabled(cache_cfg.prefix.clone()),
    };

    let engine = Arc::new(EngineGateway::new(backend, Arc::new(cache), settings.search.max_limit));
    engine.configure(&IndexSettings::default());
    Ok(engine)
}

fn synchronizer(settings: &Settings, catalog: Option<PathBuf>, engine: Arc<EngineGateway>) -> Result<IndexSynchronizer<JsonCatalog>> {
    let path = catalog.unwrap_or_else(|| expand_path(&settings.sync.catalog_path));
    let catalog = JsonCatalog::load(&path)?;
    let builder = DocumentBuilder::new(PriorityClassifier::new(&settings.priority.low_priority_pattern)?);
    Ok(IndexSynchronizer::new(catalog, engine, builder).with_batch_size(settings.sync.batch_size))
}

fn reindex(sync: &IndexSynchronizer<JsonCatalog>) -> Result<()> {
    let pb = ProgressBar::new(sync.catalog().entities().len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} products ({percent}%) {msg}")?
            .progress_chars("#>-"),
    );
    let mut offset = 0;
    let mut indexed = 0;
    loop {
        let progress = sync.reindex_batch(offset)?;
        indexed += progress.indexed;
        pb.set_position(progress.next_offset as u64);
        if progress.done {
            break;
        }
        offset = progress.next_offset;
    }
    pb.finish_with_message("done");
    println!("📊 Indexed {} products", indexed);
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
