//! In-memory caching for decoded API responses.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;
use tracing::debug;

/// Entry count above which a background sweep of expired entries is started.
const SWEEP_HIGH_WATER: usize = 500;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    stored_at: Instant,
}

#[derive(Debug)]
struct CacheInner {
    map: HashMap<String, CacheEntry>,
    max_age: Duration,
    hits: u64,
    misses: u64,
}

impl CacheInner {
    fn new(max_age: Duration) -> Self {
        Self {
            map: HashMap::new(),
            max_age,
            hits: 0,
            misses: 0,
        }
    }

    fn get(&mut self, key: &str) -> Option<Value> {
        match self.map.get(key) {
            Some(entry) if entry.stored_at.elapsed() <= self.max_age => {
                self.hits += 1;
                Some(entry.value.clone())
            }
            Some(_) => {
                // Expired entries are logically absent; drop them on read.
                self.map.remove(key);
                self.misses += 1;
                None
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, key: String, value: Value) {
        self.map.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    fn sweep_expired(&mut self) -> usize {
        let before = self.map.len();
        let max_age = self.max_age;
        self.map.retain(|_, entry| entry.stored_at.elapsed() <= max_age);
        before - self.map.len()
    }
}

/// Counter snapshot folded into the client metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

/// Bounded, time-expiring store keyed by request identity.
///
/// A zero max-age disables the cache entirely: `get` always reports absent
/// and `put` is a no-op, so the request engine never special-cases the
/// disabled state.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    inner: Arc<tokio::sync::RwLock<CacheInner>>,
    sweeping: Arc<AtomicBool>,
}

impl ResponseCache {
    pub fn new(max_age: Duration) -> Self {
        Self {
            inner: Arc::new(tokio::sync::RwLock::new(CacheInner::new(max_age))),
            sweeping: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Pass-through cache: nothing is stored, every lookup is a miss.
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        let mut store = self.inner.write().await;
        store.get(key)
    }

    /// Stores a fresh value, overwriting any previous entry for the key.
    pub async fn put(&self, key: String, value: Value) {
        let spawn_sweep = {
            let mut store = self.inner.write().await;
            if store.max_age == Duration::ZERO {
                return;
            }
            store.put(key, value);
            store.map.len() > SWEEP_HIGH_WATER
        };

        if spawn_sweep {
            self.spawn_sweep();
        }
    }

    /// Best-effort background pass removing only entries already past
    /// expiry, so a concurrent `get` never loses a live entry.
    fn spawn_sweep(&self) {
        if self.sweeping.swap(true, Ordering::SeqCst) {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let sweeping = Arc::clone(&self.sweeping);
        tokio::spawn(async move {
            let removed = {
                let mut store = inner.write().await;
                store.sweep_expired()
            };
            debug!(removed, "cache sweep removed expired entries");
            sweeping.store(false, Ordering::SeqCst);
        });
    }

    pub async fn clear(&self) {
        let mut store = self.inner.write().await;
        store.map.clear();
    }

    /// Updates the expiry window; zero disables the cache.
    pub async fn set_max_age(&self, max_age: Duration) {
        let mut store = self.inner.write().await;
        store.max_age = max_age;
        if max_age == Duration::ZERO {
            store.map.clear();
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let store = self.inner.read().await;
        CacheStats {
            hits: store.hits,
            misses: store.misses,
            entries: store.map.len(),
        }
    }

    pub async fn len(&self) -> usize {
        let store = self.inner.read().await;
        store.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn put_then_get_returns_the_value() {
        let cache = ResponseCache::new(Duration::from_secs(1));

        assert!(cache.get("k1").await.is_none());

        cache.put("k1".to_string(), json!({"x": 1})).await;
        assert_eq!(cache.get("k1").await, Some(json!({"x": 1})));

        // A fresh fetch is authoritative over whatever was cached.
        cache.put("k1".to_string(), json!({"x": 2})).await;
        assert_eq!(cache.get("k1").await, Some(json!({"x": 2})));
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss_and_is_dropped() {
        let cache = ResponseCache::new(Duration::from_millis(40));

        cache.put("k1".to_string(), json!(1)).await;
        assert!(cache.get("k1").await.is_some());

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(cache.get("k1").await.is_none());
        assert_eq!(cache.len().await, 0);

        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let cache = ResponseCache::new(Duration::from_millis(40));

        cache.put("old".to_string(), json!(1)).await;
        tokio::time::sleep(Duration::from_millis(60)).await;
        cache.put("fresh".to_string(), json!(2)).await;

        let removed = {
            let mut store = cache.inner.write().await;
            store.sweep_expired()
        };
        assert_eq!(removed, 1);
        assert_eq!(cache.get("fresh").await, Some(json!(2)));
    }

    #[tokio::test]
    async fn disabled_cache_is_a_pass_through() {
        let cache = ResponseCache::disabled();

        cache.put("k1".to_string(), json!(1)).await;
        assert!(cache.get("k1").await.is_none());
        assert_eq!(cache.len().await, 0);
    }

    #[tokio::test]
    async fn shrinking_max_age_to_zero_clears_the_store() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("k1".to_string(), json!(1)).await;

        cache.set_max_age(Duration::ZERO).await;
        assert!(cache.get("k1").await.is_none());
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn clear_drops_every_entry() {
        let cache = ResponseCache::new(Duration::from_secs(60));
        cache.put("k1".to_string(), json!(1)).await;
        cache.put("k2".to_string(), json!(2)).await;

        cache.clear().await;
        assert_eq!(cache.len().await, 0);
    }
}
