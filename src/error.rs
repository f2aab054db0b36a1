//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its facades.
///
/// The type is `Clone` so that one failed load can be handed to every caller
/// waiting on the same key.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// Mutating call after the cache was closed
    #[error("cache is closed")]
    CacheClosed,

    /// Bounded cache is full and the eviction policy offered no candidate
    #[error("memory limit exceeded: no eviction candidate available")]
    MemoryLimitExceeded,

    /// `get_or_load` was called without a loader
    #[error("a loader is required for get_or_load")]
    LoaderRequired,

    /// The loader supplied to `get_or_load` failed
    #[error("loader failed: {0}")]
    Loader(String),

    /// Value could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Storage backend failure
    #[error("backend error: {0}")]
    Backend(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Key not found in cache
    #[error("Key not found: {0}")]
    NotFound(String),

    /// Invalid configuration value
    #[error("configuration error: {0}")]
    Config(String),
}

impl CacheError {
    /// Wraps any displayable loader failure.
    pub fn loader(err: impl std::fmt::Display) -> Self {
        CacheError::Loader(err.to_string())
    }

    /// Wraps any displayable backend failure.
    pub fn backend(err: impl std::fmt::Display) -> Self {
        CacheError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization(err.to_string())
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::LoaderRequired => StatusCode::BAD_REQUEST,
            CacheError::CacheClosed | CacheError::MemoryLimitExceeded => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            CacheError::Loader(_)
            | CacheError::Serialization(_)
            | CacheError::Backend(_)
            | CacheError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
