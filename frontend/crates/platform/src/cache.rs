//! Query Cache
//!
//! Transient in-process cache of query results, keyed by strings such as
//! `opportunities:list` or `applications:student:<id>`. Entries go stale
//! after a fixed time; mutations invalidate every key under a prefix.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;

pub const DEFAULT_STALE_TIME: Duration = Duration::from_secs(30);

struct Entry {
    value: Value,
    stored_at: Instant,
}

/// Stale-time cache of JSON query results
pub struct QueryCache {
    stale_time: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(DEFAULT_STALE_TIME)
    }
}

impl QueryCache {
    pub fn new(stale_time: Duration) -> Self {
        Self {
            stale_time,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn stale_time(&self) -> Duration {
        self.stale_time
    }

    /// Fresh cached value for `key`, if any
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut entries = self.lock();
        let entry = entries.get(key)?;
        if entry.stored_at.elapsed() >= self.stale_time {
            entries.remove(key);
            return None;
        }
        // A shape mismatch is treated as a miss
        serde_json::from_value(entry.value.clone()).ok()
    }

    pub fn put<T: Serialize>(&self, key: impl Into<String>, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            return;
        };
        self.lock().insert(
            key.into(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Drop every entry whose key starts with `prefix`; returns how many
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        let removed = before - entries.len();
        if removed > 0 {
            tracing::debug!(prefix, removed, "Query cache invalidated");
        }
        removed
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value or run `fetch` and cache its result
    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(hit) = self.get::<T>(key) {
            return Ok(hit);
        }
        let value = fetch().await?;
        self.put(key, &value);
        Ok(value)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
