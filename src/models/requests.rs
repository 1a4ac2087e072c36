//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;

/// Longest key accepted over HTTP.
pub const MAX_KEY_LEN: usize = 256;

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: Any JSON value; scalars are stored as their native kind
/// - `ttl_ms`: Optional TTL in milliseconds, zero or absent keeps the entry forever
/// - `store`: Optional store alias, the default store when absent
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    pub key: String,
    pub value: serde_json::Value,
    #[serde(default)]
    pub ttl_ms: Option<i64>,
    #[serde(default)]
    pub store: Option<String>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    /// Negative TTLs are left for the store to reject.
    pub fn validate(&self) -> Option<String> {
        validate_key(&self.key)
    }
}

/// Request body for bulk invalidation (POST /invalidate)
#[derive(Debug, Clone, Deserialize)]
pub struct InvalidateRequest {
    /// Glob patterns where `*` matches any run of characters
    pub patterns: Vec<String>,
    #[serde(default)]
    pub store: Option<String>,
}

/// Optional `?store=` selector shared by the key endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreQuery {
    #[serde(default)]
    pub store: Option<String>,
}

impl StoreQuery {
    /// The alias to resolve; empty means the default store.
    pub fn alias(&self) -> &str {
        self.store.as_deref().unwrap_or("")
    }
}

pub(crate) fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LEN {
        return Some(format!(
            "Key exceeds maximum length of {} characters",
            MAX_KEY_LEN
        ));
    }
    None
}
