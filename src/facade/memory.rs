use std::time::Duration;

use async_trait::async_trait;

use super::{Cache, EntryVisitor};
use crate::cache::{CacheStats, MemoryCacheEngine};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::KeyBuilder;
use crate::singleflight::Loader;

/// [`Cache`] bound directly to an in-memory engine. Values are stored as-is,
/// without serialization.
///
/// Loads are coordinated by the engine on storage keys, so every wrapper
/// over one engine shares them.
pub struct MemoryCache<T> {
    engine: MemoryCacheEngine<T>,
    keys: KeyBuilder,
}

impl<T> Clone for MemoryCache<T> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            keys: self.keys.clone(),
        }
    }
}

impl<T> std::fmt::Debug for MemoryCache<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("engine", &self.engine)
            .field("keys", &self.keys)
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> MemoryCache<T> {
    /// Creates a cache with its own engine.
    pub fn new(config: CacheConfig, keys: KeyBuilder) -> Self {
        Self::with_engine(MemoryCacheEngine::new(config), keys)
    }

    /// Binds a namespace onto an existing (possibly shared) engine.
    pub fn with_engine(engine: MemoryCacheEngine<T>, keys: KeyBuilder) -> Self {
        Self { engine, keys }
    }

    pub fn engine(&self) -> &MemoryCacheEngine<T> {
        &self.engine
    }

    pub fn stats(&self) -> CacheStats {
        self.engine.stats()
    }

    fn storage_key(&self, key: &str) -> String {
        self.keys.build(&[key])
    }

    fn scope(&self) -> String {
        self.keys.scan_prefix()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync + 'static> Cache<T> for MemoryCache<T> {
    async fn get(&self, key: &str) -> Option<T> {
        self.engine.get(&self.storage_key(key))
    }

    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()> {
        self.engine.set(self.storage_key(key), value, ttl)
    }

    async fn get_or_load(
        &self,
        key: &str,
        loader: Option<Loader<T>>,
        ttl: Option<Duration>,
    ) -> Result<T> {
        self.engine
            .get_or_load(&self.storage_key(key), loader, ttl)
            .await
    }

    async fn contains(&self, key: &str) -> bool {
        self.engine.contains(&self.storage_key(key))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.engine.delete(&self.storage_key(key))
    }

    async fn clear(&self) -> Result<()> {
        let scope = self.scope();
        if scope.is_empty() {
            self.engine.clear();
            return Ok(());
        }
        for key in self.engine.keys(Some(&scope)) {
            self.engine.delete(&key)?;
        }
        Ok(())
    }

    async fn keys(&self) -> Vec<String> {
        self.engine
            .keys(Some(&self.scope()))
            .iter()
            .filter_map(|key| self.keys.strip(key))
            .map(str::to_string)
            .collect()
    }

    async fn for_each(&self, visitor: &mut EntryVisitor<'_, T>) -> Result<()> {
        self.engine.for_each(Some(&self.scope()), |key, value| {
            match self.keys.strip(key) {
                Some(logical) => visitor(logical, value.clone()),
                None => true,
            }
        });
        Ok(())
    }

    async fn size(&self) -> usize {
        if self.scope().is_empty() {
            return self.engine.size();
        }
        self.engine.keys(Some(&self.scope())).len()
    }

    async fn close(&self) -> Result<()> {
        self.engine.close();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;
    use crate::eviction::EvictionPolicy;
    use crate::singleflight::loader_fn;

    fn cache(prefix: &str) -> MemoryCache<u32> {
        MemoryCache::new(CacheConfig::default(), KeyBuilder::new(prefix))
    }

    #[tokio::test]
    async fn test_memory_cache_namespaces_keys() {
        let cache = cache("app");
        cache.set("a", 1, None).await.unwrap();

        assert_eq!(cache.get("a").await, Some(1));
        assert!(cache.engine().contains("app:a"));
        assert_eq!(cache.keys().await, vec!["a".to_string()]);
    }

    #[tokio::test]
    async fn test_shared_engine_namespaces_are_isolated() {
        let engine = MemoryCacheEngine::new(CacheConfig::default());
        let users = MemoryCache::with_engine(engine.clone(), KeyBuilder::new("users"));
        let orders = MemoryCache::with_engine(engine.clone(), KeyBuilder::new("orders"));

        users.set("1", 10u32, None).await.unwrap();
        users.set("2", 20, None).await.unwrap();
        orders.set("1", 30, None).await.unwrap();

        assert_eq!(users.size().await, 2);
        assert_eq!(orders.get("1").await, Some(30));

        users.clear().await.unwrap();
        assert_eq!(users.size().await, 0);
        assert_eq!(orders.size().await, 1);
        assert_eq!(engine.size(), 1);
    }

    #[tokio::test]
    async fn test_memory_cache_for_each_yields_logical_keys() {
        let cache = cache("app");
        cache.set("x", 1, None).await.unwrap();
        cache.set("y", 2, None).await.unwrap();

        let mut seen = Vec::new();
        cache
            .for_each(&mut |key, value| {
                seen.push((key.to_string(), value));
                true
            })
            .await
            .unwrap();
        seen.sort();
        assert_eq!(seen, vec![("x".to_string(), 1), ("y".to_string(), 2)]);
    }

    #[tokio::test]
    async fn test_memory_cache_get_or_load() {
        let cache = cache("");
        let loader = loader_fn(|key: String| async move { Ok(key.len() as u32) });

        assert_eq!(cache.get_or_load("hello", Some(loader), None).await, Ok(5));
        assert_eq!(cache.get("hello").await, Some(5));
        assert_eq!(
            cache.get_or_load("hello", None, None).await,
            Err(CacheError::LoaderRequired)
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wrappers_over_one_engine_share_loads() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let engine = MemoryCacheEngine::new(CacheConfig::default());
        let first = MemoryCache::with_engine(engine.clone(), KeyBuilder::new("app"));
        let second = MemoryCache::with_engine(engine.clone(), KeyBuilder::new("app"));
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..16)
            .map(|i| {
                let cache = if i % 2 == 0 { first.clone() } else { second.clone() };
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    let loader = loader_fn(move |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(7u32)
                    });
                    cache.get_or_load("shared", Some(loader), None).await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(7));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(engine.get("app:shared"), Some(7));
    }

    #[tokio::test]
    async fn test_memory_cache_bounded() {
        let cache: MemoryCache<u32> = MemoryCache::new(
            CacheConfig::default()
                .with_max_size(2)
                .with_eviction_policy(EvictionPolicy::Fifo),
            KeyBuilder::default(),
        );
        cache.set("a", 1, None).await.unwrap();
        cache.set("b", 2, None).await.unwrap();
        cache.set("c", 3, None).await.unwrap();

        assert!(!cache.contains("a").await);
        assert_eq!(cache.size().await, 2);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_memory_cache_close_outside_runtime() {
        let cache = cache("app");
        tokio_test::block_on(async {
            cache.set("a", 1, None).await.unwrap();
            cache.close().await.unwrap();
            assert_eq!(cache.get("a").await, None);
            assert_eq!(cache.set("a", 2, None).await, Err(CacheError::CacheClosed));
        });
    }
}
