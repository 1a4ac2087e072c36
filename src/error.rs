//! Error types for the cache
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for stores, the coercion engine and the manager.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key absent or expired
    #[error("cache miss: {0}")]
    Miss(String),

    /// Stored value cannot be coerced to the requested type
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// Stored text or structure could not be parsed into the requested type
    #[error("conversion error: {0}")]
    Conversion(String),

    /// Caller supplied an invalid argument (negative TTL)
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Key pattern could not be compiled into a matcher
    #[error("invalid pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A store is already registered under this alias
    #[error("store already registered: {0}")]
    AlreadyRegistered(String),

    /// Alias does not name a registered store
    #[error("invalid default store: {0}")]
    InvalidDefaultStore(String),

    /// Default-value producer failed
    #[error("producer failed: {0}")]
    Producer(#[source] anyhow::Error),

    /// Driver or runtime failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl CacheError {
    /// True when the key was absent or expired.
    pub fn is_miss(&self) -> bool {
        matches!(self, CacheError::Miss(_))
    }

    /// True when a value was present but had the wrong shape.
    pub fn is_mismatch(&self) -> bool {
        matches!(
            self,
            CacheError::TypeMismatch(_) | CacheError::Conversion(_)
        )
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::Miss(_) => StatusCode::NOT_FOUND,
            CacheError::TypeMismatch(_)
            | CacheError::Conversion(_)
            | CacheError::InvalidValue(_)
            | CacheError::InvalidPattern { .. } => StatusCode::BAD_REQUEST,
            CacheError::AlreadyRegistered(_) | CacheError::InvalidDefaultStore(_) => {
                StatusCode::CONFLICT
            }
            CacheError::Producer(_) | CacheError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = Json(json!({
            "error": self.to_string()
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
