//! Process-wide memoisation with a fixed time to live.
//!
//! Population is not de-duplicated: two callers that miss on the same key at the same time
//! will both compute the value and the last write wins.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::Instant;

struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: RwLock<HashMap<K, CacheEntry<V>>>,
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a clone of the cached value if it has not yet expired
    pub async fn get(&self, key: &K) -> Option<V> {
        let entries = self.entries.read().await;
        entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    pub async fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().await;
        // Drop anything stale while we hold the write lock anyway
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    #[cfg(test)]
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// (total entries, entries still valid)
    #[cfg(test)]
    pub async fn stats(&self) -> (usize, usize) {
        let entries = self.entries.read().await;
        let now = Instant::now();
        let valid = entries.values().filter(|e| e.expires_at > now).count();
        (entries.len(), valid)
    }
}
