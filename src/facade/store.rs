use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use super::{Cache, EntryVisitor};
use crate::error::Result;
use crate::key::KeyBuilder;
use crate::serializer::Serializer;
use crate::singleflight::{LoadGroup, LoadTarget, Loader};
use crate::store::Store;

/// [`Cache`] over a byte [`Store`], encoding values with a [`Serializer`].
pub struct StoreCache<T, S, Z> {
    store: Arc<S>,
    serializer: Arc<Z>,
    keys: KeyBuilder,
    loads: LoadGroup<T>,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S, Z> Clone for StoreCache<T, S, Z> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            serializer: Arc::clone(&self.serializer),
            keys: self.keys.clone(),
            loads: self.loads.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T, S: Store, Z> std::fmt::Debug for StoreCache<T, S, Z> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreCache")
            .field("store", &self.store.name())
            .field("keys", &self.keys)
            .finish()
    }
}

impl<T, S, Z> StoreCache<T, S, Z>
where
    T: Clone + Send + Sync + 'static,
    S: Store,
    Z: Serializer<T>,
{
    pub fn new(store: S, serializer: Z, keys: KeyBuilder) -> Self {
        Self::with_shared(Arc::new(store), Arc::new(serializer), keys)
    }

    /// Binds a namespace onto a store shared with other caches.
    pub fn with_shared(store: Arc<S>, serializer: Arc<Z>, keys: KeyBuilder) -> Self {
        Self {
            store,
            serializer,
            keys,
            loads: LoadGroup::new(),
            _marker: PhantomData,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    fn storage_key(&self, key: &str) -> String {
        self.keys.build(&[key])
    }
}

#[async_trait]
impl<T, S, Z> Cache<T> for StoreCache<T, S, Z>
where
    T: Clone + Send + Sync + 'static,
    S: Store,
    Z: Serializer<T>,
{
    async fn get(&self, key: &str) -> Option<T> {
        let storage_key = self.storage_key(key);
        let bytes = match self.store.get(&storage_key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                warn!(key = %storage_key, store = self.store.name(), error = %err, "Store read failed");
                return None;
            }
        };
        match self.serializer.deserialize(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %storage_key, error = %err, "Discarding undecodable cache value");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()> {
        let bytes = self.serializer.serialize(&value)?;
        self.store.set(&self.storage_key(key), bytes, ttl).await
    }

    async fn get_or_load(
        &self,
        key: &str,
        loader: Option<Loader<T>>,
        ttl: Option<Duration>,
    ) -> Result<T> {
        self.loads.get_or_load(self, key, loader, ttl).await
    }

    async fn contains(&self, key: &str) -> bool {
        let storage_key = self.storage_key(key);
        match self.store.contains(&storage_key).await {
            Ok(found) => found,
            Err(err) => {
                warn!(key = %storage_key, store = self.store.name(), error = %err, "Store lookup failed");
                false
            }
        }
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.store.delete(&self.storage_key(key)).await
    }

    async fn clear(&self) -> Result<()> {
        self.store.clear(&self.keys.scan_prefix()).await
    }

    async fn keys(&self) -> Vec<String> {
        match self.store.keys(&self.keys.scan_prefix()).await {
            Ok(keys) => keys
                .iter()
                .filter_map(|key| self.keys.strip(key))
                .map(str::to_string)
                .collect(),
            Err(err) => {
                warn!(store = self.store.name(), error = %err, "Store key scan failed");
                Vec::new()
            }
        }
    }

    async fn for_each(&self, visitor: &mut EntryVisitor<'_, T>) -> Result<()> {
        let keys = &self.keys;
        let serializer = &self.serializer;
        self.store
            .for_each(&keys.scan_prefix(), &mut |key, bytes| {
                let Some(logical) = keys.strip(key) else {
                    return true;
                };
                match serializer.deserialize(bytes) {
                    Ok(value) => visitor(logical, value),
                    Err(err) => {
                        warn!(key, error = %err, "Skipping undecodable cache value");
                        true
                    }
                }
            })
            .await
    }

    async fn size(&self) -> usize {
        match self.store.size(&self.keys.scan_prefix()).await {
            Ok(size) => size,
            Err(err) => {
                warn!(store = self.store.name(), error = %err, "Store size query failed");
                0
            }
        }
    }

    async fn close(&self) -> Result<()> {
        self.store.close().await
    }
}

#[async_trait]
impl<T, S, Z> LoadTarget<T> for StoreCache<T, S, Z>
where
    T: Clone + Send + Sync + 'static,
    S: Store,
    Z: Serializer<T>,
{
    async fn lookup(&self, key: &str) -> Option<T> {
        Cache::get(self, key).await
    }

    async fn populate(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()> {
        Cache::set(self, key, value, ttl).await
    }
}
