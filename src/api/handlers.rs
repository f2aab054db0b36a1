//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::cache::MemoryCacheEngine;
use crate::config::ServerConfig;
use crate::error::{CacheError, Result};
use crate::facade::{Cache, MemoryCache};
use crate::key::KeyBuilder;
use crate::models::{
    ClearResponse, DeleteResponse, GetResponse, HealthResponse, KeysQuery, KeysResponse,
    SetRequest, SetResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache handle is internally synchronized, so handlers share it by
/// cloning without any outer lock.
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: MemoryCache<String>,
}

impl AppState {
    pub fn new(cache: MemoryCache<String>) -> Self {
        Self { cache }
    }

    /// Builds the engine and key namespace described by `config`.
    pub fn from_config(config: &ServerConfig) -> Self {
        let engine = MemoryCacheEngine::new(config.cache.clone());
        Self::new(MemoryCache::with_engine(
            engine,
            KeyBuilder::new(config.key_prefix.clone()),
        ))
    }
}

/// Handler for PUT /set
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> Result<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let ttl = req.ttl();
    state.cache.set(&req.key, req.value, ttl).await?;

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    match state.cache.get(&key).await {
        Some(value) => Ok(Json(GetResponse::new(key, value))),
        None => Err(CacheError::NotFound(key)),
    }
}

/// Handler for DELETE /del/:key
///
/// Responds 404 when the key is absent, matching GET.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if !state.cache.contains(&key).await {
        return Err(CacheError::NotFound(key));
    }
    state.cache.delete(&key).await?;

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for GET /keys
pub async fn keys_handler(
    State(state): State<AppState>,
    Query(query): Query<KeysQuery>,
) -> Json<KeysResponse> {
    let mut keys = state.cache.keys().await;
    if let Some(prefix) = query.prefix.as_deref() {
        keys.retain(|key| key.starts_with(prefix));
    }
    Json(KeysResponse::new(keys))
}

/// Handler for DELETE /clear
pub async fn clear_handler(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    let removed = state.cache.size().await;
    state.cache.clear().await?;
    Ok(Json(ClearResponse::new(removed)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let engine = state.cache.engine();
    Json(StatsResponse::new(
        &engine.stats(),
        engine.policy(),
        engine.max_size(),
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;

    fn test_state() -> AppState {
        AppState::new(MemoryCache::new(
            CacheConfig::default().with_max_size(100),
            KeyBuilder::default(),
        ))
    }

    fn set_request(key: &str, value: &str) -> Json<SetRequest> {
        Json(SetRequest {
            key: key.to_string(),
            value: value.to_string(),
            ttl: None,
        })
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let result = set_handler(State(state.clone()), set_request("test_key", "test_value")).await;
        assert!(result.is_ok());

        let response = get_handler(State(state), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let result = get_handler(State(test_state()), Path("nonexistent".to_string())).await;
        assert_eq!(
            result.unwrap_err(),
            CacheError::NotFound("nonexistent".to_string())
        );
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        set_handler(State(state.clone()), set_request("to_delete", "value"))
            .await
            .unwrap();

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(CacheError::NotFound(_))));

        let result = get_handler(State(state), Path("to_delete".to_string())).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_keys_and_clear_handlers() {
        let state = test_state();
        for key in ["user:1", "user:2", "order:1"] {
            set_handler(State(state.clone()), set_request(key, "v"))
                .await
                .unwrap();
        }

        let all = keys_handler(State(state.clone()), Query(KeysQuery::default())).await;
        assert_eq!(all.count, 3);

        let users = keys_handler(
            State(state.clone()),
            Query(KeysQuery {
                prefix: Some("user:".to_string()),
            }),
        )
        .await;
        assert_eq!(users.keys, vec!["user:1".to_string(), "user:2".to_string()]);

        let cleared = clear_handler(State(state.clone())).await.unwrap();
        assert_eq!(cleared.removed, 3);
        assert_eq!(state.cache.size().await, 0);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        let _ = get_handler(State(state.clone()), Path("missing".to_string())).await;

        let response = stats_handler(State(state)).await;
        assert_eq!(response.hits, 0);
        assert_eq!(response.misses, 1);
        assert_eq!(response.eviction_policy, "lru");
        assert_eq!(response.max_entries, 100);
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }

    #[tokio::test]
    async fn test_set_invalid_request() {
        let result = set_handler(State(test_state()), set_request("", "value")).await;
        assert!(matches!(result, Err(CacheError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_from_config_applies_prefix() {
        let config = ServerConfig {
            key_prefix: "svc".to_string(),
            ..ServerConfig::default()
        };
        let state = AppState::from_config(&config);
        set_handler(State(state.clone()), set_request("a", "1"))
            .await
            .unwrap();

        assert!(state.cache.engine().contains("svc:a"));
        let keys = keys_handler(State(state), Query(KeysQuery::default())).await;
        assert_eq!(keys.keys, vec!["a".to_string()]);
    }
}
