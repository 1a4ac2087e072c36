//! Manager Module
//!
//! Owns a set of named stores, tracks which one is the default, and exposes
//! typed access, lazy defaults and bulk invalidation on top of them.

mod fetched;
mod view;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use chrono::Duration;
use serde::de::DeserializeOwned;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::cache::CacheStats;
use crate::convert::{FromValue, ToValue};
use crate::error::{CacheError, Result};
use crate::store::Store;
use crate::value::Value;

pub use fetched::Fetched;
pub use view::Cache;

#[derive(Default)]
struct Registry {
    stores: HashMap<String, Arc<dyn Store>>,
    default: Option<String>,
}

impl Registry {
    fn cache(&self, alias: &str) -> Option<Cache> {
        self.stores
            .get(alias)
            .map(|store| Cache::new(alias, Arc::clone(store)))
    }

    fn default_cache(&self) -> Result<Cache> {
        self.default
            .as_deref()
            .and_then(|alias| self.cache(alias))
            .ok_or_else(|| CacheError::InvalidDefaultStore("no store registered".to_string()))
    }
}

// == Manager ==
/// Registry of named stores with a switchable default.
///
/// The first registered store becomes the default. Every forwarding method
/// acts on whichever store is the default at call time.
#[derive(Default)]
pub struct Manager {
    registry: RwLock<Registry>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager").finish_non_exhaustive()
    }
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    // == Registration ==
    /// Takes ownership of `store` under `alias`.
    pub async fn register<S>(&self, alias: impl Into<String>, store: S) -> Result<()>
    where
        S: Store + 'static,
    {
        let alias = alias.into();
        let mut registry = self.registry.write().await;
        if registry.stores.contains_key(&alias) {
            return Err(CacheError::AlreadyRegistered(alias));
        }

        registry.stores.insert(alias.clone(), Arc::new(store));
        if registry.default.is_none() {
            registry.default = Some(alias.clone());
        }
        info!(store = %alias, "Registered cache store");
        Ok(())
    }

    /// Makes `alias` the default store.
    pub async fn set_default(&self, alias: &str) -> Result<()> {
        let mut registry = self.registry.write().await;
        if !registry.stores.contains_key(alias) {
            return Err(CacheError::InvalidDefaultStore(alias.to_string()));
        }
        registry.default = Some(alias.to_string());
        debug!(store = alias, "Default cache store changed");
        Ok(())
    }

    pub async fn default_alias(&self) -> Option<String> {
        self.registry.read().await.default.clone()
    }

    /// Registered aliases, sorted.
    pub async fn aliases(&self) -> Vec<String> {
        let mut aliases: Vec<String> = self.registry.read().await.stores.keys().cloned().collect();
        aliases.sort();
        aliases
    }

    // == Views ==
    /// A view bound to `alias`, or to the current default when `alias` is
    /// empty or unknown. The manager's default is not changed.
    pub async fn store(&self, alias: &str) -> Result<Cache> {
        let registry = self.registry.read().await;
        if let Some(cache) = registry.cache(alias) {
            return Ok(cache);
        }
        if !alias.is_empty() {
            debug!(store = alias, "Unknown store alias, using default");
        }
        registry.default_cache()
    }

    /// A view bound to the current default store.
    pub async fn current(&self) -> Result<Cache> {
        self.registry.read().await.default_cache()
    }

    // == Forwarding to the default store ==
    pub async fn get_value(&self, key: &str) -> Result<Value> {
        self.current().await?.get_value(key).await
    }

    pub async fn get<T: FromValue>(&self, key: &str) -> Result<T> {
        self.current().await?.get(key).await
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

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.current().await?.get_json(key).await
    }

    pub async fn has(&self, key: &str) -> Result<bool> {
        self.current().await?.has(key).await
    }

    pub async fn set<V: ToValue + ?Sized>(&self, key: &str, value: &V, ttl: Duration) -> Result<()> {
        self.current().await?.set(key, value, ttl).await
    }

    pub async fn set_value(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        self.current().await?.set_value(key, value, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<()> {
        self.current().await?.delete(key).await
    }

    pub async fn delete_many(&self, keys: &[String]) -> Result<()> {
        self.current().await?.delete_many(keys).await
    }

    pub async fn delete_by_pattern(&self, pattern: &str) -> Result<()> {
        self.current().await?.delete_by_pattern(pattern).await
    }

    /// Concurrent pattern deletion on the default store; see
    /// [`Cache::delete_many_by_pattern`].
    pub async fn delete_many_by_pattern<P: AsRef<str>>(&self, patterns: &[P]) -> Result<()> {
        self.current().await?.delete_many_by_pattern(patterns).await
    }

    pub async fn clear(&self) -> Result<()> {
        self.current().await?.clear().await
    }

    pub async fn stats(&self) -> Result<Option<CacheStats>> {
        Ok(self.current().await?.stats().await)
    }

    /// Lazy default on the default store; see [`Cache::get_or_set`].
    pub async fn get_or_set<T, F, Fut>(&self, key: &str, ttl: Duration, producer: F) -> Result<Fetched<T>>
    where
        T: FromValue + ToValue,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        self.current().await?.get_or_set(key, ttl, producer).await
    }

    // == Shutdown ==
    /// Closes every registered store. All stores are closed even when one
    /// fails; the first error is returned.
    pub async fn close(&self) -> Result<()> {
        let stores: Vec<(String, Arc<dyn Store>)> = self
            .registry
            .read()
            .await
            .stores
            .iter()
            .map(|(alias, store)| (alias.clone(), Arc::clone(store)))
            .collect();

        let mut first_error = None;
        for (alias, store) in stores {
            if let Err(error) = store.close().await {
                warn!(store = %alias, %error, "Failed to close cache store");
                first_error.get_or_insert(error);
            }
        }

        first_error.map_or(Ok(()), Err)
    }
}
