//! Store Contract
//!
//! The uniform interface every cache driver implements. The manager only
//! ever talks to stores through this trait.

use async_trait::async_trait;
use chrono::Duration;

use crate::cache::CacheStats;
use crate::error::Result;
use crate::value::Value;

/// A key/value store with TTL semantics.
///
/// Implementations must be safe for concurrent callers. Absence is always
/// reported as [`CacheError::Miss`](crate::CacheError::Miss) from `get`, and
/// as `false` from `has`; deleting an absent key is not an error.
#[async_trait]
pub trait Store: Send + Sync {
    /// Removes every key.
    async fn clear(&self) -> Result<()>;

    /// Releases background resources. Calling it more than once is fine.
    async fn close(&self) -> Result<()>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every key matching a glob where `*` is any run of characters.
    /// An empty pattern matches nothing.
    async fn delete_by_pattern(&self, pattern: &str) -> Result<()>;

    async fn delete_many(&self, keys: &[String]) -> Result<()>;

    async fn get(&self, key: &str) -> Result<Value>;

    async fn has(&self, key: &str) -> Result<bool>;

    /// Stores `value`. A positive `ttl` expires the entry after that long,
    /// zero keeps it forever, negative is rejected with `InvalidValue`.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()>;

    /// Activity counters. Drivers that do not track them return `None`.
    async fn stats(&self) -> Option<CacheStats> {
        None
    }
}
