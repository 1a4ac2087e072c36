//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cache::CacheStats;
use crate::value::Value;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// Alias of the store that answered
    pub store: String,
    /// The stored value, rendered as JSON
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, store: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            store: store.into(),
            value,
        }
    }
}

/// Response body for the existence check (GET /has/:key)
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub key: String,
    pub exists: bool,
}

impl HasResponse {
    pub fn new(key: impl Into<String>, exists: bool) -> Self {
        Self {
            key: key.into(),
            exists,
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
///
/// Deleting an absent key still succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for bulk invalidation (POST /invalidate)
#[derive(Debug, Clone, Serialize)]
pub struct InvalidateResponse {
    pub message: String,
    /// Number of patterns processed
    pub patterns: usize,
}

impl InvalidateResponse {
    pub fn new(patterns: usize) -> Self {
        Self {
            message: format!("Invalidated {} pattern(s)", patterns),
            patterns,
        }
    }
}

/// Response body for DELETE /clear
#[derive(Debug, Clone, Serialize)]
pub struct ClearResponse {
    pub message: String,
    pub store: String,
}

impl ClearResponse {
    pub fn new(store: impl Into<String>) -> Self {
        let store = store.into();
        Self {
            message: format!("Store '{}' cleared", store),
            store,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Alias of the store the numbers belong to
    pub store: String,
    /// False when the driver does not keep counters; the numbers are then zero
    pub tracked: bool,
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a store's statistics
    pub fn new(store: impl Into<String>, stats: Option<CacheStats>) -> Self {
        let tracked = stats.is_some();
        let stats = stats.unwrap_or_default();
        Self {
            store: store.into(),
            tracked,
            hit_rate: stats.hit_rate(),
            stats,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Registered store aliases
    pub stores: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(stores: Vec<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            stores,
            timestamp: Utc::now(),
        }
    }
}
