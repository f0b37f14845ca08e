use anyhow::{anyhow, Result};
use std::sync::Mutex;
use std::time::Duration;

use catsearch_core::traits::CacheBackend;

const SCAN_COUNT: usize = 200;

/// Redis-backed cache. One lazily (re)opened connection, bounded by the
/// configured timeout on connect, read and write.
pub struct RedisCache {
    client: redis::Client,
    conn: Mutex<Option<redis::Connection>>,
    timeout: Duration,
}

impl RedisCache {
    pub fn open(url: &str, timeout: Duration) -> Result<Self> {
        let client = redis::Client::open(url)?;
        Ok(Self { client, conn: Mutex::new(None), timeout })
    }

    fn with_conn<T>(&self, op: impl FnOnce(&mut redis::Connection) -> redis::RedisResult<T>) -> Result<T> {
        let mut guard = self.conn.lock().map_err(|_| anyhow!("redis connection lock poisoned"))?;
        if guard.is_none() {
            let conn = self.client.get_connection_with_timeout(self.timeout)?;
            conn.set_read_timeout(Some(self.timeout))?;
            conn.set_write_timeout(Some(self.timeout))?;
            *guard = Some(conn);
        }
        let conn = guard.as_mut().ok_or_else(|| anyhow!("redis connection unavailable"))?;
        match op(conn) {
            Ok(value) => Ok(value),
            Err(e) => {
                // reconnect on next use
                *guard = None;
                Err(e.into())
            }
        }
    }
}

/// Escape glob metacharacters so the prefix matches literally in `SCAN MATCH`.
fn match_pattern(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.chars() {
        if matches!(c, '*' | '?' | '[' | ']' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('*');
    pattern
}

impl CacheBackend for RedisCache {
    fn ping(&self) -> Result<()> {
        self.with_conn(|conn| redis::cmd("PING").query::<String>(conn)).map(|_| ())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.with_conn(|conn| redis::cmd("GET").arg(key).query::<Option<Vec<u8>>>(conn))
    }

    fn set_if_absent(&self, key: &str, value: &[u8], ttl_secs: u64) -> Result<bool> {
        let reply = self.with_conn(|conn| {
            redis::cmd("SET").arg(key).arg(value).arg("EX").arg(ttl_secs.max(1)).arg("NX").query::<Option<String>>(conn)
        })?;
        Ok(reply.is_some())
    }

    fn delete_by_prefix(&self, prefix: &str) -> Result<usize> {
        let pattern = match_pattern(prefix);
        self.with_conn(|conn| {
            let mut cursor: u64 = 0;
            let mut removed = 0usize;
            loop {
                let (next, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(&pattern)
                    .arg("COUNT")
                    .arg(SCAN_COUNT)
                    .query(conn)?;
                if !keys.is_empty() {
                    removed += redis::cmd("DEL").arg(&keys).query::<usize>(conn)?;
                }
                if next == 0 {
                    break;
                }
                cursor = next;
            }
            Ok(removed)
        })
    }
}
