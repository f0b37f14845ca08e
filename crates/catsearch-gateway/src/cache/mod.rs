//! Search result cache keyed by `(query, options)`.
//!
//! The backend is pinged once at construction. If it is unreachable then, the
//! gateway stays disabled for the process lifetime instead of retrying per
//! request. Later backend failures count as a miss (reads) or a no-op (writes).
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::hash::Hasher;
use tracing::{debug, info, warn};
use twox_hash::XxHash64;

use catsearch_core::error::Error;
use catsearch_core::traits::CacheBackend;
use catsearch_core::types::SearchOptions;

mod memory;
mod redis_cache;

pub use self::memory::MemoryCache;
pub use self::redis_cache::RedisCache;

pub const DEFAULT_TTL_SECS: u64 = 300;

pub struct CacheGateway {
    backend: Option<Box<dyn CacheBackend>>,
    prefix: String,
    ttl_secs: u64,
}

impl CacheGateway {
    pub fn connect(backend: Box<dyn CacheBackend>, prefix: impl Into<String>, ttl_secs: u64) -> Self {
        let prefix = prefix.into();
        match backend.ping() {
            Ok(()) => {
                info!(prefix = %prefix, ttl_secs, "search cache enabled");
                Self { backend: Some(backend), prefix, ttl_secs }
            }
            Err(e) => {
                let err = Error::CacheUnavailable(e.to_string());
                warn!(error = %err, "search cache disabled for this process");
                Self { backend: None, prefix, ttl_secs }
            }
        }
    }

    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self { backend: None, prefix: prefix.into(), ttl_secs: DEFAULT_TTL_SECS }
    }

    pub fn is_enabled(&self) -> bool {
        self.backend.is_some()
    }

    /// `<prefix><xxh64 of the serialized (query, options) pair>`.
    pub fn key_for(&self, query: &str, options: &SearchOptions) -> String {
        let payload = serde_json::to_vec(&(query, options)).unwrap_or_else(|_| query.as_bytes().to_vec());
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&payload);
        format!("{}{:016x}", self.prefix, hasher.finish())
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        let backend = self.backend.as_ref()?;
        match backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                let err = Error::CacheUnavailable(e.to_string());
                warn!(key, error = %err, "cache read failed, treating as miss");
                None
            }
        }
    }

    pub fn set_if_absent_or_expired(&self, key: &str, value: &[u8], ttl_secs: u64) {
        let Some(backend) = self.backend.as_ref() else { return };
        match backend.set_if_absent(key, value, ttl_secs) {
            Ok(written) => debug!(key, written, "cache write"),
            Err(e) => {
                let err = Error::CacheUnavailable(e.to_string());
                warn!(key, error = %err, "cache write failed");
            }
        }
    }

    pub fn invalidate_by_prefix(&self, prefix: &str) {
        let Some(backend) = self.backend.as_ref() else { return };
        match backend.delete_by_prefix(prefix) {
            Ok(removed) => debug!(prefix, removed, "cache invalidated"),
            Err(e) => {
                let err = Error::CacheUnavailable(e.to_string());
                warn!(prefix, error = %err, "cache invalidation failed");
            }
        }
    }

    /// Drop every entry in this gateway's namespace.
    pub fn invalidate_all(&self) {
        self.invalidate_by_prefix(&self.prefix);
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "undecodable cache entry, treating as miss");
                None
            }
        }
    }

    /// Write with the gateway's TTL.
    pub fn put_json<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_vec(value) {
            Ok(bytes) => self.set_if_absent_or_expired(key, &bytes, self.ttl_secs),
            Err(e) => warn!(key, error = %e, "cache entry not serializable"),
        }
    }
}
