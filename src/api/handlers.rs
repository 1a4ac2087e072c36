//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint. Every key endpoint
//! accepts an optional store alias and falls back to the default store.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Duration;
use tracing::debug;

use crate::error::{CacheError, Result};
use crate::manager::Manager;
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HasResponse, HealthResponse, InvalidateRequest,
    InvalidateResponse, SetRequest, SetResponse, StatsResponse, StoreQuery,
};
use crate::value::Value;

/// Application state shared across all handlers.
///
/// The manager synchronises internally, so the state is a plain `Arc`.
#[derive(Clone, Debug)]
pub struct AppState {
    pub manager: Arc<Manager>,
}

impl AppState {
    pub fn new(manager: Manager) -> Self {
        Self {
            manager: Arc::new(manager),
        }
    }

    pub fn from_shared(manager: Arc<Manager>) -> Self {
        Self { manager }
    }
}

/// Handler for PUT /set
///
/// Stores a JSON value, with an optional TTL in milliseconds.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidValue(error_msg));
    }

    let cache = state
        .manager
        .store(req.store.as_deref().unwrap_or(""))
        .await?;
    let ttl_ms = req.ttl_ms.unwrap_or(0);
    let ttl = Duration::try_milliseconds(ttl_ms).ok_or_else(|| {
        CacheError::InvalidValue(format!("ttl_ms {} is out of range", ttl_ms))
    })?;
    cache.set_value(&req.key, Value::from(req.value), ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<GetResponse>> {
    let cache = state.manager.store(query.alias()).await?;
    let value = cache.get_value(&key).await?;

    Ok(Json(GetResponse::new(key, cache.alias(), value)))
}

/// Handler for GET /has/:key
pub async fn has_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<HasResponse>> {
    let cache = state.manager.store(query.alias()).await?;
    let exists = cache.has(&key).await?;

    Ok(Json(HasResponse::new(key, exists)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<DeleteResponse>> {
    let cache = state.manager.store(query.alias()).await?;
    cache.delete(&key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /invalidate
///
/// Runs every pattern concurrently against one store.
pub async fn invalidate_handler(
    State(state): State<AppState>,
    Json(req): Json<InvalidateRequest>,
) -> Result<Json<InvalidateResponse>> {
    let cache = state
        .manager
        .store(req.store.as_deref().unwrap_or(""))
        .await?;
    debug!(store = %cache.alias(), patterns = req.patterns.len(), "Invalidating patterns");
    cache.delete_many_by_pattern(&req.patterns).await?;

    Ok(Json(InvalidateResponse::new(req.patterns.len())))
}

/// Handler for DELETE /clear
pub async fn clear_handler(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<ClearResponse>> {
    let cache = state.manager.store(query.alias()).await?;
    cache.clear().await?;

    Ok(Json(ClearResponse::new(cache.alias())))
}

/// Handler for GET /stats
pub async fn stats_handler(
    State(state): State<AppState>,
    Query(query): Query<StoreQuery>,
) -> Result<Json<StatsResponse>> {
    let cache = state.manager.store(query.alias()).await?;
    let stats = cache.stats().await;

    Ok(Json(StatsResponse::new(cache.alias(), stats)))
}

/// Handler for GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.manager.aliases().await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use crate::config::StoreConfig;

    async fn test_state() -> AppState {
        let manager = Manager::new();
        manager
            .register(
                "memory",
                MemoryStore::new(StoreConfig::default().with_cleanup_interval(std::time::Duration::ZERO)),
            )
            .await
            .unwrap();
        AppState::new(manager)
    }

    fn set_request(key: &str, value: serde_json::Value) -> SetRequest {
        SetRequest {
            key: key.to_string(),
            value,
            ttl_ms: None,
            store: None,
        }
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state().await;

        let req = set_request("test_key", serde_json::json!("test_value"));
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(
            State(state.clone()),
            Path("test_key".to_string()),
            Query(StoreQuery::default()),
        )
        .await
        .unwrap();
        assert_eq!(response.value, Value::from("test_value"));
        assert_eq!(response.store, "memory");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state().await;

        let result = get_handler(
            State(state),
            Path("nonexistent".to_string()),
            Query(StoreQuery::default()),
        )
        .await;
        assert!(matches!(result, Err(CacheError::Miss(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state().await;

        let req = set_request("to_delete", serde_json::json!(1));
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let result = delete_handler(
            State(state.clone()),
            Path("to_delete".to_string()),
            Query(StoreQuery::default()),
        )
        .await;
        assert!(result.is_ok());

        let response = has_handler(
            State(state),
            Path("to_delete".to_string()),
            Query(StoreQuery::default()),
        )
        .await
        .unwrap();
        assert!(!response.exists);
    }

    #[tokio::test]
    async fn test_set_negative_ttl_rejected() {
        let state = test_state().await;

        let mut req = set_request("k", serde_json::json!(true));
        req.ttl_ms = Some(-5);
        let result = set_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
    }

    #[tokio::test]
    async fn test_set_out_of_range_ttl_rejected() {
        let state = test_state().await;

        let mut req = set_request("k", serde_json::json!(1));
        req.ttl_ms = Some(i64::MIN);
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(CacheError::InvalidValue(_))));
        assert!(!state.manager.has("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let state = test_state().await;

        let req = set_request("", serde_json::json!("value"));
        let result = set_handler(State(state), Json(req)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_invalidate_handler() {
        let state = test_state().await;
        for key in ["user:1", "user:2", "order:1"] {
            set_handler(State(state.clone()), Json(set_request(key, serde_json::json!(0))))
                .await
                .unwrap();
        }

        let req = InvalidateRequest {
            patterns: vec!["user:*".into()],
            store: None,
        };
        let response = invalidate_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.patterns, 1);

        assert!(!state.manager.has("user:1").await.unwrap());
        assert!(state.manager.has("order:1").await.unwrap());
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state().await;

        let response = stats_handler(State(state), Query(StoreQuery::default()))
            .await
            .unwrap();
        assert!(response.tracked);
        assert_eq!(response.stats.hits, 0);
        assert_eq!(response.stats.misses, 0);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler(State(test_state().await)).await;
        assert_eq!(response.status, "healthy");
        assert_eq!(response.stores, vec!["memory"]);
    }
}
