//! Cachet - an embeddable key-value cache engine
//!
//! A concurrent, TTL-aware, size-bounded in-memory engine with pluggable
//! eviction (LRU, LFU, FIFO), coalesced loading of missing keys, and a typed
//! [`Cache`] facade over either the engine or any byte [`Store`]. A small
//! axum server in [`api`] exposes one engine over HTTP.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod eviction;
pub mod facade;
pub mod key;
pub mod models;
pub mod serializer;
pub mod singleflight;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheStats, MemoryCacheEngine};
pub use config::{CacheConfig, ServerConfig};
pub use error::{CacheError, Result};
pub use eviction::{EvictionHandler, EvictionPolicy};
pub use facade::{Cache, MemoryCache, StoreCache};
pub use key::KeyBuilder;
pub use serializer::{JsonSerializer, Serializer};
pub use singleflight::{loader_fn, Loader};
pub use store::{MemoryStore, Store};
