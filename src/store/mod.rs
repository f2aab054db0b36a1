//! Store Module
//!
//! Byte-oriented storage contract consumed by [`StoreCache`], plus the
//! in-memory implementation. Keys handed to a store are already namespaced.
//!
//! [`StoreCache`]: crate::facade::StoreCache

mod memory;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::Result;

pub use memory::MemoryStore;

/// Callback for [`Store::for_each`]; return false to stop iterating.
pub type StoreVisitor<'a> = dyn FnMut(&str, &[u8]) -> bool + Send + 'a;

/// Storage backend for serialized values.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Backend name, used in logs
    fn name(&self) -> &str;

    async fn get(&self, key: &str) -> Result<Option<Bytes>>;

    /// Writes a value. `None` or zero `ttl` means the backend default.
    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<()>;

    async fn contains(&self, key: &str) -> Result<bool>;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every key starting with `prefix` (all keys if empty).
    async fn clear(&self, prefix: &str) -> Result<()>;

    async fn keys(&self, prefix: &str) -> Result<Vec<String>>;

    async fn for_each(&self, prefix: &str, visitor: &mut StoreVisitor<'_>) -> Result<()>;

    /// Number of keys starting with `prefix`.
    async fn size(&self, prefix: &str) -> Result<usize>;

    async fn close(&self) -> Result<()>;
}
