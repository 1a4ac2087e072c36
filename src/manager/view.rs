//! Typed view over a single store.

use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::cache::CacheStats;
use crate::convert::{convert, FromValue, Json, ToValue};
use crate::error::{CacheError, Result};
use crate::manager::Fetched;
use crate::store::Store;
use crate::value::Value;

/// A store bound to its alias, with typed accessors on top of the raw
/// [`Store`] contract.
///
/// Cheap to clone; every clone talks to the same underlying store.
#[derive(Clone)]
pub struct Cache {
    alias: String,
    store: Arc<dyn Store>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache").field("alias", &self.alias).finish()
    }
}

impl Cache {
    pub fn new(alias: impl Into<String>, store: Arc<dyn Store>) -> Self {
        Self {
            alias: alias.into(),
            store,
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    // == Reads ==
    /// Raw stored value.
    pub async fn get_value(&self, key: &str) -> Result<Value> {
        self.store.get(key).await
    }

    /// Reads `key` and coerces it to `T`.
    pub async fn get<T: FromValue>(&self, key: &str) -> Result<T> {
        let raw = self.store.get(key).await?;
        convert(&raw)
    }

    pub async fn get_string(&self, key: &str) -> Result<String> {
        self.get(key).await
    }

    pub async fn get_i64(&self, key: &str) -> Result<i64> {
        self.get(key).await
    }

    pub async fn get_bool(&self, key: &str) -> Result<bool> {
        self.get(key).await
    }

    pub async fn get_f64(&self, key: &str) -> Result<f64> {
        self.get(key).await
    }

    pub async fn get_bytes(&self, key: &str) -> Result<Vec<u8>> {
        self.get(key).await
    }

    /// Reads a value stored through its serde representation.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get::<Json<T>>(key).await.map(Json::into_inner)
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        self.store.has(key).await
    }

    // == Writes ==
    pub async fn set<V: ToValue + ?Sized>(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        let raw = value.to_value()?;
        self.store.set(key, raw, ttl).await
    }

    pub async fn set_value(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.store.set(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(key).await
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<()> {
        self.store.delete_many(keys).await
    }

    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<()> {
        self.store.delete_by_pattern(pattern).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    pub async fn close(&self) -> Result<()> {
        self.store.close().await
    }

    /// Activity counters, when the driver keeps them.
    pub async fn stats(&self) -> Option<CacheStats> {
        self.store.stats().await
    }

    // == Fan-out Invalidation ==
    /// Runs one pattern deletion task per pattern concurrently.
    ///
    /// Every task runs to completion, even if the returned future is dropped
    /// before they finish. The first error in pattern order is returned and
    /// later ones are only logged.
    pub async fn delete_many_by_pattern<P: AsRef<str>>(&self, patterns: &[P]) -> Result<()> {
        // Dropped handles detach; tasks outlive a cancelled caller
        let handles: Vec<JoinHandle<Result<()>>> = patterns
            .iter()
            .map(|pattern| {
                let store = Arc::clone(&self.store);
                let pattern = pattern.as_ref().to_string();
                tokio::spawn(async move { store.delete_by_pattern(&pattern).await })
            })
            .collect();

        let mut first_error = None;
        for handle in handles {
            let outcome = handle
                .await
                .map_err(|e| CacheError::Internal(format!("pattern deletion task failed: {}", e)))
                .and_then(|result| result);

            if let Err(error) = outcome {
                if first_error.is_none() {
                    first_error = Some(error);
                } else {
                    debug!(store = %self.alias, %error, "Additional pattern deletion error");
                }
            }
        }

        first_error.map_or(Ok(()), Err)
    }

    // == Lazy Default ==
    /// Returns the cached value under `key`, or computes it with `producer`,
    /// stores it with `ttl` and returns it.
    ///
    /// The producer runs only when the key is missing or holds a value that
    /// cannot be read as `T`. A producer error is returned as
    /// [`CacheError::Producer`] and nothing is written. A failed write does
    /// not lose the produced value: it comes back as [`Fetched::Unsaved`].
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<Fetched<T>>
    where
        T: FromValue + ToValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get::<T>(key).await {
            Ok(value) => return Ok(Fetched::Hit(value)),
            Err(e) if e.is_miss() || e.is_mismatch() => {
                debug!(store = %self.alias, key, reason = %e, "Computing default value");
            }
            Err(e) => return Err(e),
        }

        let value = producer().await.map_err(CacheError::Producer)?;

        let written = match value.to_value() {
            Ok(raw) => self.store.set(key, raw, ttl).await,
            Err(e) => Err(e),
        };

        match written {
            Ok(()) => Ok(Fetched::Populated(value)),
            Err(error) => {
                warn!(store = %self.alias, key, %error, "Could not store computed default");
                Ok(Fetched::Unsaved { value, error })
            }
        }
    }
}
