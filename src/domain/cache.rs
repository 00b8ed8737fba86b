//! Short-lived memo of collector results.
//!
//! One entry per metric key. Entries are never evicted: a stale entry is
//! treated as absent and overwritten by the next successful collection.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde_json::Value;
use tokio::sync::RwLock;

pub const DEFAULT_TTL: Duration = Duration::from_millis(5000);

struct CacheEntry {
    data: Value,
    stored_at: Instant,
}

pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        self.get_at(key, Instant::now()).await
    }

    /// Return the value for `key` if it was stored less than one TTL before `now`.
    pub async fn get_at(&self, key: &str, now: Instant) -> Option<Value> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;
        if now.saturating_duration_since(entry.stored_at) < self.ttl {
            Some(entry.data.clone())
        } else {
            None
        }
    }

    pub async fn set(&self, key: &str, data: Value) {
        self.set_at(key, data, Instant::now()).await
    }

    pub async fn set_at(&self, key: &str, data: Value, now: Instant) {
        self.entries.write().await.insert(
            key.to_string(),
            CacheEntry {
                data,
                stored_at: now,
            },
        );
    }
}

impl Default for TtlCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
