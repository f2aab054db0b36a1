//! In-memory [`Store`] backed by [`MemoryCacheEngine`].

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{Store, StoreVisitor};
use crate::cache::MemoryCacheEngine;
use crate::config::CacheConfig;
use crate::error::Result;

/// Byte store that keeps everything in a local [`MemoryCacheEngine`].
#[derive(Debug, Clone)]
pub struct MemoryStore {
    engine: MemoryCacheEngine<Bytes>,
}

impl MemoryStore {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            engine: MemoryCacheEngine::new(config),
        }
    }

    /// The underlying engine, for stats and diagnostics.
    pub fn engine(&self) -> &MemoryCacheEngine<Bytes> {
        &self.engine
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>> {
        Ok(self.engine.get(key))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Option<Duration>) -> Result<()> {
        self.engine.set(key, value, ttl)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.engine.contains(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.engine.delete(key)
    }

    async fn clear(&self, prefix: &str) -> Result<()> {
        if prefix.is_empty() {
            self.engine.clear();
            return Ok(());
        }
        for key in self.engine.keys(Some(prefix)) {
            self.engine.delete(&key)?;
        }
        Ok(())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        Ok(self.engine.keys(Some(prefix)))
    }

    async fn for_each(&self, prefix: &str, visitor: &mut StoreVisitor<'_>) -> Result<()> {
        self.engine
            .for_each(Some(prefix), |key, value| visitor(key, value.as_ref()));
        Ok(())
    }

    async fn size(&self, prefix: &str) -> Result<usize> {
        if prefix.is_empty() {
            return Ok(self.engine.size());
        }
        Ok(self.engine.keys(Some(prefix)).len())
    }

    async fn close(&self) -> Result<()> {
        self.engine.close();
        Ok(())
    }
}
