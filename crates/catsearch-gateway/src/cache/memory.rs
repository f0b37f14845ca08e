use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use catsearch_core::traits::CacheBackend;

/// In-process cache with per-entry expiry, for single-process deployments and tests.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (Vec<u8>, Instant)>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries held, including any that expired since the last write.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheBackend for MemoryCache {
    fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self.entries.lock().map_err(|_| anyhow!("memory cache lock poisoned"))?;
        Ok(entries.get(key).filter(|(_, expires)| *expires > Instant::now()).map(|(v, _)| v.clone()))
    }

    fn set_if_absent(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<bool> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("memory cache lock poisoned"))?;
        let now = Instant::now();
        if entries.get(key).is_some_and(|(_, expires)| *expires > now) {
            return Ok(false);
        }
        entries.retain(|_, (_, expires)| *expires > now);
        entries.insert(key.to_string(), (value.to_vec(), now + Duration::from_secs(ttl_secs)));
        Ok(true)
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let mut entries = self.entries.lock().map_err(|_| anyhow!("memory cache lock poisoned"))?;
        let before = entries.len();
        entries.retain(|k, _| !k.starts_with(prefix));
        Ok(before - entries.len())
    }
}
