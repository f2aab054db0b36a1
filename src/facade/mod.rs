//! Cache Facade Module
//!
//! The typed [`Cache`] contract and its two bindings: directly onto a
//! [`MemoryCacheEngine`](crate::cache::MemoryCacheEngine), or onto any
//! [`Store`](crate::store::Store) through a serializer.
//!
//! Every operation takes a logical key, which the facade namespaces through
//! its [`KeyBuilder`](crate::key::KeyBuilder). Reads never fail: backend and
//! decoding errors on the read path are logged and reported as misses. Write
//! errors are returned.

mod memory;
mod store;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::singleflight::Loader;

pub use memory::MemoryCache;
pub use store::StoreCache;

/// Callback for [`Cache::for_each`]; return false to stop iterating.
pub type EntryVisitor<'a, T> = dyn FnMut(&str, T) -> bool + Send + 'a;

/// Typed cache operations.
#[async_trait]
pub trait Cache<T: Send + 'static>: Send + Sync {
    async fn get(&self, key: &str) -> Option<T>;

    /// Stores a value. `None` or zero `ttl` applies the default TTL.
    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>;

    /// Returns the cached value or loads it, running `loader` at most once
    /// across concurrent callers for the same key.
    async fn get_or_load(
        &self,
        key: &str,
        loader: Option<Loader<T>>,
        ttl: Option<Duration>,
    ) -> Result<T>;

    async fn contains(&self, key: &str) -> bool;

    async fn delete(&self, key: &str) -> Result<()>;

    /// Removes every key in this cache's namespace.
    async fn clear(&self) -> Result<()>;

    /// Logical keys currently cached in this namespace.
    async fn keys(&self) -> Vec<String>;

    async fn for_each(&self, visitor: &mut EntryVisitor<'_, T>) -> Result<()>;

    async fn size(&self) -> usize;

    async fn close(&self) -> Result<()>;
}
