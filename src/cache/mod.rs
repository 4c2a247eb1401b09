//! TTL response cache
//!
//! Each key owns an async slot. Readers of the same key serialize on that
//! slot, so an expired entry is refilled by exactly one fetch no matter how
//! many callers ask for it at once.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::metrics;

/// A stored response
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub data: Value,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.stored_at.elapsed() < ttl
    }
}

/// How a `get_or_fetch` call was served
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    Hit,
    Miss,
}

type Slot = Arc<Mutex<Option<CacheEntry>>>;

/// Response cache keyed by request, with a fixed time-to-live
#[derive(Debug)]
pub struct ResponseCache {
    ttl: Duration,
    slots: DashMap<String, Slot>,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: DashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn slot(&self, key: &str) -> Slot {
        Arc::clone(&*self.slots.entry(key.to_string()).or_default())
    }

    /// Fresh value for `key`, if any
    pub async fn get(&self, key: &str) -> Option<Value> {
        let slot = self.slots.get(key).map(|s| Arc::clone(&*s))?;
        let entry = slot.lock().await;
        let fresh = entry
            .as_ref()
            .filter(|e| e.is_fresh(self.ttl))
            .map(|e| e.data.clone());
        fresh
    }

    /// Store `data` under `key`, restarting its TTL
    pub async fn insert(&self, key: &str, data: Value) {
        let slot = self.slot(key);
        *slot.lock().await = Some(CacheEntry {
            data,
            stored_at: Instant::now(),
        });
    }

    /// Return the fresh value for `key`, or run `fetch` once and store its result
    ///
    /// Failed fetches are not cached; the previous (stale) entry is kept.
    pub async fn get_or_fetch<F, Fut, E>(&self, key: &str, fetch: F) -> Result<(Value, CacheOutcome), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        let slot = self.slot(key);
        let mut entry = slot.lock().await;

        if let Some(cached) = entry.as_ref().filter(|e| e.is_fresh(self.ttl)) {
            metrics::record_cache_lookup(true);
            return Ok((cached.data.clone(), CacheOutcome::Hit));
        }

        metrics::record_cache_lookup(false);
        debug!("cache miss for {}", key);
        let data = fetch().await?;
        *entry = Some(CacheEntry {
            data: data.clone(),
            stored_at: Instant::now(),
        });
        Ok((data, CacheOutcome::Miss))
    }

    /// Drop one key
    pub fn invalidate(&self, key: &str) -> bool {
        self.slots.remove(key).is_some()
    }

    /// Drop every key
    pub fn clear(&self) {
        self.slots.clear();
    }

    /// Number of keys with a slot, fresh or not
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove expired entries, returning how many were dropped
    ///
    /// Slots currently locked by a fill are left alone.
    pub fn purge_expired(&self) -> usize {
        let before = self.slots.len();
        self.slots.retain(|_, slot| match slot.try_lock() {
            Ok(entry) => entry.as_ref().map(|e| e.is_fresh(self.ttl)).unwrap_or(false),
            Err(_) => true,
        });
        before.saturating_sub(self.slots.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_ttl_expiry() {
        let cache = ResponseCache::new(Duration::from_secs(30));
        cache.insert("k", json!(1)).await;
        assert_eq!(cache.get("k").await, Some(json!(1)));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cache.get("k").await, None);
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_not_cached() {
        let cache = ResponseCache::new(Duration::from_secs(30));
        let calls = AtomicUsize::new(0);

        let result: Result<_, String> = cache
            .get_or_fetch("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("down".to_string())
            })
            .await;
        assert!(result.is_err());

        let (value, outcome) = cache
            .get_or_fetch("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(json!({"ok": true}))
            })
            .await
            .unwrap();
        assert_eq!(outcome, CacheOutcome::Miss);
        assert_eq!(value, json!({"ok": true}));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = ResponseCache::new(Duration::from_secs(30));
        cache.insert("k", json!(1)).await;
        assert!(cache.invalidate("k"));
        assert!(!cache.invalidate("k"));
        assert_eq!(cache.get("k").await, None);
    }
}
