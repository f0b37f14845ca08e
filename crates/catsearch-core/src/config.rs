//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_CACHE__URL`).
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::document::DEFAULT_LOW_PRIORITY_PATTERN;
use crate::error::{Error, Result};

pub const DEFAULT_INDEX_DIR: &str = "~/.catsearch/index";

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    /// Wrap an already-assembled figment. Missing keys fall back to defaults.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extract and validate the typed settings.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineConfig,
    pub search: SearchConfig,
    pub cache: CacheConfig,
    pub sync: SyncConfig,
    pub priority: PriorityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// On-disk index location, `~` and `${VAR}` expanded. `None` keeps the index in memory.
    pub index_dir: Option<String>,
    pub writer_memory_bytes: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self { index_dir: Some(DEFAULT_INDEX_DIR.to_string()), writer_memory_bytes: 50_000_000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub default_limit: usize,
    pub max_limit: usize,
    pub min_query_len: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_limit: 20, max_limit: 100, min_query_len: 2 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    Redis,
    Memory,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    pub url: Option<String>,
    pub ttl_secs: u64,
    pub prefix: String,
    pub timeout_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Redis,
            url: None,
            ttl_secs: 300,
            prefix: "catsearch:search:".to_string(),
            timeout_ms: 250,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub batch_size: usize,
    pub catalog_path: String,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { batch_size: 50, catalog_path: "products.json".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PriorityConfig {
    pub low_priority_pattern: String,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        Self { low_priority_pattern: DEFAULT_LOW_PRIORITY_PATTERN.to_string() }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.search.default_limit == 0 || self.search.max_limit == 0 {
            return Err(Error::InvalidConfig("search limits must be positive".into()));
        }
        if self.search.default_limit > self.search.max_limit {
            return Err(Error::InvalidConfig(format!(
                "search.default_limit {} exceeds search.max_limit {}",
                self.search.default_limit, self.search.max_limit
            )));
        }
        if self.sync.batch_size == 0 {
            return Err(Error::InvalidConfig("sync.batch_size must be positive".into()));
        }
        if self.cache.prefix.is_empty() {
            return Err(Error::InvalidConfig("cache.prefix must not be empty".into()));
        }
        regex::Regex::new(&self.priority.low_priority_pattern)
            .map_err(|e| Error::InvalidConfig(format!("priority.low_priority_pattern: {}", e)))?;
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}
