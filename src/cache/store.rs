//! In-Process Store Module
//!
//! TTL store backed by a `HashMap` behind an async `RwLock`, with lazy expiry
//! on read, glob pattern deletion and a background sweeper.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::cache::stats::StatCounters;
use crate::cache::{CacheStats, Entry, KeyPattern};
use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::error::{CacheError, Result};
use crate::store::Store;
use crate::tasks::{spawn_sweeper, SweeperHandle};
use crate::value::Value;

// == Shared State ==
/// State shared between the store handle and its sweeper task.
#[derive(Debug)]
pub(crate) struct StoreInner {
    entries: RwLock<HashMap<String, Entry>>,
    clock: Arc<dyn Clock>,
    stats: StatCounters,
}

impl StoreInner {
    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// First sweep phase: keys past their expiry, under the read lock.
    pub(crate) async fn collect_expired(&self) -> Vec<String> {
        let now = self.now();
        self.entries
            .read()
            .await
            .iter()
            .filter(|(_, entry)| entry.is_sweepable(now))
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Second sweep phase: removes the collected keys under the write lock.
    ///
    /// Each key is re-checked, so an entry overwritten since collection
    /// survives and a key already removed by a reader is not counted twice.
    pub(crate) async fn remove_expired(&self, keys: &[String]) -> usize {
        if keys.is_empty() {
            return 0;
        }

        let now = self.now();
        let mut entries = self.entries.write().await;
        let mut removed = 0;
        for key in keys {
            if entries.get(key).is_some_and(|entry| entry.is_sweepable(now)) {
                entries.remove(key);
                removed += 1;
            }
        }
        drop(entries);

        self.stats.record_expirations(removed);
        removed
    }

    /// Drops `key` if it is still expired; returns whether it was removed.
    async fn expire_key(&self, key: &str) -> bool {
        let now = self.now();
        let mut entries = self.entries.write().await;
        let removed = match entries.get(key) {
            Some(entry) if entry.is_expired(now) => entries.remove(key).is_some(),
            _ => false,
        };
        drop(entries);

        if removed {
            self.stats.record_expirations(1);
        }
        removed
    }
}

// == Memory Store ==
/// Concurrency-safe in-process store with TTL support.
///
/// Construction starts a sweeper on the current tokio runtime that removes
/// expired entries every `cleanup_interval`. Outside a runtime, or with a
/// zero interval, no sweeper runs and expiry is purely lazy.
#[derive(Debug)]
pub struct MemoryStore {
    inner: Arc<StoreInner>,
    sweeper: Mutex<Option<SweeperHandle>>,
}

impl MemoryStore {
    // == Constructor ==
    pub fn new(config: StoreConfig) -> Self {
        let inner = Arc::new(StoreInner {
            entries: RwLock::new(HashMap::new()),
            clock: config.clock,
            stats: StatCounters::default(),
        });

        let sweeper = if config.cleanup_interval.is_zero() {
            debug!("Sweeper disabled: zero cleanup interval");
            None
        } else {
            match tokio::runtime::Handle::try_current() {
                Ok(runtime) => Some(spawn_sweeper(
                    &runtime,
                    Arc::clone(&inner),
                    config.cleanup_interval,
                )),
                Err(_) => {
                    warn!("No tokio runtime available; store will expire entries lazily only");
                    None
                }
            }
        };

        Self {
            inner,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Store with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(StoreConfig::default())
    }

    fn now(&self) -> DateTime<Utc> {
        self.inner.now()
    }

    // == Set ==
    /// Stores `value` under `key`, replacing any previous entry.
    ///
    /// A negative `ttl` fails with `InvalidValue` and leaves the existing
    /// entry untouched.
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        if ttl < Duration::zero() {
            return Err(CacheError::InvalidValue(format!(
                "ttl must not be negative, got {}ms for key {}",
                ttl.num_milliseconds(),
                key
            )));
        }

        let entry = Entry::new(value, ttl, self.now());
        self.inner
            .entries
            .write()
            .await
            .insert(key.to_string(), entry);
        self.inner.stats.record_set();

        Ok(())
    }

    // == Get ==
    /// Returns the live value under `key`.
    ///
    /// An expired entry is removed before the miss is reported.
    pub async fn get(&self, key: &str) -> Result<Value> {
        let now = self.now();
        let found = {
            let entries = self.inner.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => Some(Ok(entry.value.clone())),
                Some(_) => Some(Err(())),
                None => None,
            }
        };

        match found {
            Some(Ok(value)) => {
                self.inner.stats.record_hit();
                Ok(value)
            }
            Some(Err(())) => {
                self.inner.expire_key(key).await;
                self.inner.stats.record_miss();
                Err(CacheError::Miss(key.to_string()))
            }
            None => {
                self.inner.stats.record_miss();
                Err(CacheError::Miss(key.to_string()))
            }
        }
    }

    // == Has ==
    /// True iff a live entry exists. Expired entries are removed.
    pub async fn has(&self, key: &str) -> bool {
        let now = self.now();
        let state = self
            .inner
            .entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.is_expired(now));

        match state {
            Some(false) => true,
            Some(true) => {
                self.inner.expire_key(key).await;
                false
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes `key`; absent keys are ignored.
    pub async fn delete(&self, key: &str) {
        let removed = self.inner.entries.write().await.remove(key).is_some();
        if removed {
            self.inner.stats.record_deletes(1);
        }
    }

    /// Removes each of `keys`; absent keys are ignored.
    pub async fn delete_many(&self, keys: &[String]) {
        if keys.is_empty() {
            return;
        }

        let mut entries = self.inner.entries.write().await;
        let removed = keys
            .iter()
            .filter(|key| entries.remove(key.as_str()).is_some())
            .count();
        drop(entries);

        self.inner.stats.record_deletes(removed);
    }

    // == Delete By Pattern ==
    /// Removes every key matching the glob `pattern` and returns how many
    /// were removed.
    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<usize> {
        let matcher = KeyPattern::compile(pattern)?;
        if matcher.is_empty() {
            return Ok(0);
        }

        let mut entries = self.inner.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !matcher.matches(key));
        let removed = before - entries.len();
        drop(entries);

        self.inner.stats.record_deletes(removed);
        debug!(pattern, removed, "Deleted keys by pattern");
        Ok(removed)
    }

    // == Clear ==
    pub async fn clear(&self) {
        let mut entries = self.inner.entries.write().await;
        let removed = entries.len();
        entries.clear();
        drop(entries);

        self.inner.stats.record_deletes(removed);
        debug!(removed, "Cleared store");
    }

    // == Purge Expired ==
    /// Runs one sweep immediately and returns the number of entries removed.
    pub async fn purge_expired(&self) -> usize {
        let expired = self.inner.collect_expired().await;
        self.inner.remove_expired(&expired).await
    }

    // == Close ==
    /// Stops the sweeper and waits for it to exit. Idempotent.
    pub async fn close(&self) -> Result<()> {
        let Some(sweeper) = self.sweeper.lock().await.take() else {
            return Ok(());
        };

        sweeper
            .shutdown()
            .await
            .map_err(|e| CacheError::Internal(format!("sweeper task failed: {}", e)))?;
        info!("Memory store closed");
        Ok(())
    }

    // == Introspection ==
    /// Number of stored entries, including expired ones not yet removed.
    pub async fn len(&self) -> usize {
        self.inner.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.entries.read().await.is_empty()
    }

    /// Remaining lifetime of the live entry under `key`.
    ///
    /// `Ok(None)` means the entry never expires.
    pub async fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let now = self.now();
        let entries = self.inner.entries.read().await;
        match entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Ok(entry.ttl_remaining(now)),
            _ => Err(CacheError::Miss(key.to_string())),
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let total = self.len().await;
        self.inner.stats.snapshot(total)
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Some(sweeper) = self.sweeper.get_mut().take() {
            sweeper.signal();
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn clear(&self) -> Result<()> {
        MemoryStore::clear(self).await;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        MemoryStore::close(self).await
    }

    async fn delete(&self, key: &str) -> Result<()> {
        MemoryStore::delete(self, key).await;
        Ok(())
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<()> {
        MemoryStore::delete_by_pattern(self, pattern).await.map(|_| ())
    }

    async fn delete_many(&self, keys: &[String]) -> Result<()> {
        MemoryStore::delete_many(self, keys).await;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Value> {
        MemoryStore::get(self, key).await
    }

    async fn has(&self, key: &str) -> Result<bool> {
        Ok(MemoryStore::has(self, key).await)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        MemoryStore::set(self, key, value, ttl).await
    }

    async fn stats(&self) -> Option<CacheStats> {
        Some(MemoryStore::stats(self).await)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn manual_store() -> (MemoryStore, ManualClock) {
        let clock = ManualClock::default();
        let config = StoreConfig::default()
            .with_cleanup_interval(std::time::Duration::ZERO)
            .with_clock(Arc::new(clock.clone()));
        (MemoryStore::new(config), clock)
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let (store, _) = manual_store();

        store.set("key1", Value::from("value1"), Duration::zero()).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Value::from("value1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let (store, _) = manual_store();
        assert!(matches!(store.get("nope").await, Err(CacheError::Miss(_))));
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let (store, _) = manual_store();

        store.set("key1", Value::Int(1), Duration::zero()).await.unwrap();
        store.set("key1", Value::Int(2), Duration::zero()).await.unwrap();

        assert_eq!(store.get("key1").await.unwrap(), Value::Int(2));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_ttl_boundary() {
        let (store, clock) = manual_store();
        store.set("k", Value::Int(1), Duration::seconds(5)).await.unwrap();

        clock.advance(Duration::milliseconds(4_999));
        assert!(store.get("k").await.is_ok());

        clock.advance(Duration::milliseconds(1));
        assert!(matches!(store.get("k").await, Err(CacheError::Miss(_))));
        assert_eq!(store.len().await, 0, "expired entry removed by the read");
    }

    #[tokio::test]
    async fn test_store_never_expires_with_zero_ttl() {
        let (store, clock) = manual_store();
        store.set("k", Value::Int(1), Duration::zero()).await.unwrap();

        clock.advance(Duration::days(365 * 50));
        assert_eq!(store.get("k").await.unwrap(), Value::Int(1));
    }

    #[tokio::test]
    async fn test_store_negative_ttl_keeps_previous_entry() {
        let (store, _) = manual_store();
        store.set("k", Value::from("old"), Duration::zero()).await.unwrap();

        let result = store.set("k", Value::from("new"), Duration::milliseconds(-1)).await;
        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
        assert_eq!(store.get("k").await.unwrap(), Value::from("old"));
    }

    #[tokio::test]
    async fn test_store_has_removes_expired() {
        let (store, clock) = manual_store();
        store.set("k", Value::Int(1), Duration::seconds(1)).await.unwrap();
        assert!(store.has("k").await);

        clock.advance(Duration::seconds(1));
        assert!(!store.has("k").await);
        assert!(store.is_empty().await);
        assert_eq!(store.stats().await.expirations, 1);
    }

    #[tokio::test]
    async fn test_store_delete_nonexistent_is_noop() {
        let (store, _) = manual_store();
        store.set("a", Value::Int(1), Duration::zero()).await.unwrap();

        store.delete("missing").await;
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_delete_many() {
        let (store, _) = manual_store();
        for key in ["a", "b", "c"] {
            store.set(key, Value::from(key), Duration::zero()).await.unwrap();
        }

        store.delete_many(&[]).await;
        assert_eq!(store.len().await, 3);

        store
            .delete_many(&["a".to_string(), "zzz".to_string(), "c".to_string()])
            .await;
        assert!(!store.has("a").await);
        assert!(store.has("b").await);
        assert!(!store.has("c").await);
    }

    #[tokio::test]
    async fn test_store_delete_by_pattern() {
        let (store, _) = manual_store();
        for key in ["user:1", "user:2", "product:1"] {
            store.set(key, Value::from(key), Duration::zero()).await.unwrap();
        }

        assert_eq!(store.delete_by_pattern("").await.unwrap(), 0);
        assert_eq!(store.len().await, 3);

        assert_eq!(store.delete_by_pattern("user:*").await.unwrap(), 2);
        assert!(store.has("product:1").await);
        assert_eq!(store.len().await, 1);

        assert_eq!(store.delete_by_pattern("*").await.unwrap(), 1);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_clear() {
        let (store, _) = manual_store();
        store.set("a", Value::Int(1), Duration::zero()).await.unwrap();
        store.set("b", Value::Int(2), Duration::seconds(10)).await.unwrap();

        store.clear().await;
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_purge_expired() {
        let (store, clock) = manual_store();
        store.set("short", Value::Int(1), Duration::seconds(1)).await.unwrap();
        store.set("long", Value::Int(2), Duration::hours(1)).await.unwrap();
        store.set("forever", Value::Int(3), Duration::zero()).await.unwrap();

        clock.advance(Duration::seconds(2));
        assert_eq!(store.purge_expired().await, 1);
        assert_eq!(store.len().await, 2);
        assert_eq!(store.purge_expired().await, 0);
    }

    #[tokio::test]
    async fn test_remove_expired_skips_overwritten_keys() {
        let (store, clock) = manual_store();
        store.set("k", Value::Int(1), Duration::seconds(1)).await.unwrap();
        clock.advance(Duration::seconds(2));

        let collected = store.inner.collect_expired().await;
        assert_eq!(collected, vec!["k".to_string()]);

        // Re-set between the two sweep phases
        store.set("k", Value::Int(2), Duration::zero()).await.unwrap();
        assert_eq!(store.inner.remove_expired(&collected).await, 0);
        assert_eq!(store.get("k").await.unwrap(), Value::Int(2));
    }

    #[tokio::test]
    async fn test_store_ttl_remaining() {
        let (store, clock) = manual_store();
        store.set("k", Value::Int(1), Duration::seconds(10)).await.unwrap();
        store.set("p", Value::Int(1), Duration::zero()).await.unwrap();

        clock.advance(Duration::seconds(3));
        assert_eq!(store.ttl("k").await.unwrap(), Some(Duration::seconds(7)));
        assert_eq!(store.ttl("p").await.unwrap(), None);
        assert!(store.ttl("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_store_stats() {
        let (store, _) = manual_store();

        store.set("key1", Value::Int(1), Duration::zero()).await.unwrap();
        store.get("key1").await.unwrap();
        let _ = store.get("nonexistent").await;
        store.delete("key1").await;

        let stats = store.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.deletes, 1);
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test]
    async fn test_close_without_sweeper_is_ok() {
        let (store, _) = manual_store();
        store.close().await.unwrap();
        store.close().await.unwrap();
    }

    #[test]
    fn test_store_outside_runtime_has_no_sweeper() {
        let store = MemoryStore::with_defaults();
        tokio_test::block_on(async {
            store.set("k", Value::Int(1), Duration::zero()).await.unwrap();
            store.close().await.unwrap();
        });
    }
}
