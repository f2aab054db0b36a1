//! Cache Engine Module
//!
//! Main cache engine combining a concurrent entry table with pluggable
//! eviction tracking and TTL expiration.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::{CacheEntry, CacheStats, StatsCounters};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::eviction::{new_handler, EvictionHandler, EvictionPolicy};
use crate::singleflight::{LoadGroup, LoadTarget, Loader};
use crate::tasks::{spawn_reaper_task, PurgeExpired};

struct Reaper {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl Reaper {
    /// Cancels the task and aborts it at its next await point.
    fn stop(&self) {
        self.cancel.cancel();
        if let Some(task) = &self.task {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

struct EngineInner<V> {
    /// Key-value storage
    entries: DashMap<String, CacheEntry<V>>,
    /// Live entry count, kept in lock-step with `entries` and `handler`
    size: AtomicUsize,
    handler: Box<dyn EvictionHandler>,
    policy: EvictionPolicy,
    /// Maximum number of entries allowed, 0 = unbounded
    max_size: usize,
    default_ttl: Duration,
    closed: AtomicBool,
    /// Serializes every mutation of `entries`, `size` and `handler`
    write_lock: Mutex<()>,
    stats: StatsCounters,
    reaper: Mutex<Option<Reaper>>,
}

impl<V> EngineInner<V> {
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Resolves the expiry for a write: a non-zero explicit TTL wins, then a
    /// non-zero default, otherwise the entry never expires.
    fn effective_ttl(&self, ttl: Option<Duration>) -> Option<Duration> {
        match ttl {
            Some(ttl) if !ttl.is_zero() => Some(ttl),
            _ if !self.default_ttl.is_zero() => Some(self.default_ttl),
            _ => None,
        }
    }

    /// Records a read of `key` with the eviction handler.
    fn touch(&self, key: &str) {
        if self.policy == EvictionPolicy::None {
            return;
        }
        let _guard = self.write_lock.lock();
        // the key may have been deleted between the read and this point
        if self.entries.contains_key(key) {
            self.handler.on_access(key);
        }
    }

    /// Removes `key` if it is still expired. Returns true if it was removed.
    fn remove_expired(&self, key: &str) -> bool {
        let _guard = self.write_lock.lock();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some();
        if removed {
            self.handler.on_evict(key);
            self.size.fetch_sub(1, Ordering::AcqRel);
            self.stats.record_expiration();
            debug!(key, "Removed expired entry");
        }
        removed
    }

    /// Evicts `victim` to make room. Caller holds `write_lock`.
    fn evict_locked(&self, victim: &str) {
        if self.entries.remove(victim).is_some() {
            self.size.fetch_sub(1, Ordering::AcqRel);
            self.stats.record_eviction();
            debug!(key = victim, policy = %self.policy, "Evicted entry");
        }
        self.handler.on_evict(victim);
    }
}

impl<V: Send + Sync + 'static> PurgeExpired for EngineInner<V> {
    fn purge_expired(&self) -> usize {
        if self.is_closed() {
            return 0;
        }
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.value().is_expired_at(now))
            .map(|entry| entry.key().clone())
            .collect();

        expired
            .iter()
            .filter(|key| self.remove_expired(key))
            .count()
    }
}

impl<V> Drop for EngineInner<V> {
    fn drop(&mut self) {
        if let Some(reaper) = self.reaper.get_mut() {
            reaper.stop();
        }
    }
}

// == Memory Cache Engine ==
/// Concurrent, TTL-aware, size-bounded in-memory cache.
///
/// Reads of independent keys proceed in parallel on the sharded entry table.
/// Every mutation runs under a single per-engine lock so that the table, the
/// size counter and the eviction handler never disagree about which keys
/// exist, and so that two concurrent inserts cannot both claim the last free
/// slot.
///
/// Handles are cheap to clone and share one engine. A background reaper is
/// started on the current tokio runtime at construction; without a runtime
/// expired entries are only removed lazily (or via [`purge_expired`]).
///
/// After [`close`], reads behave like an empty cache and writes fail with
/// [`CacheError::CacheClosed`].
///
/// [`purge_expired`]: MemoryCacheEngine::purge_expired
/// [`close`]: MemoryCacheEngine::close
pub struct MemoryCacheEngine<V> {
    inner: Arc<EngineInner<V>>,
    loads: LoadGroup<V>,
}

impl<V> Clone for MemoryCacheEngine<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            loads: self.loads.clone(),
        }
    }
}

impl<V> std::fmt::Debug for MemoryCacheEngine<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCacheEngine")
            .field("policy", &self.inner.policy)
            .field("max_size", &self.inner.max_size)
            .field("size", &self.inner.size.load(Ordering::Relaxed))
            .field("closed", &self.inner.is_closed())
            .finish()
    }
}

impl<V: Clone + Send + Sync + 'static> MemoryCacheEngine<V> {
    // == Constructor ==
    /// Creates an engine and starts its background reaper.
    pub fn new(config: CacheConfig) -> Self {
        let policy = config.eviction_policy.effective(config.max_size);
        if policy != config.eviction_policy {
            debug!(
                requested = %config.eviction_policy,
                effective = %policy,
                max_size = config.max_size,
                "Adjusted eviction policy to cache bound"
            );
        }

        let inner = Arc::new(EngineInner {
            entries: DashMap::new(),
            size: AtomicUsize::new(0),
            handler: new_handler(policy),
            policy,
            max_size: config.max_size,
            default_ttl: config.default_ttl,
            closed: AtomicBool::new(false),
            write_lock: Mutex::new(()),
            stats: StatsCounters::default(),
            reaper: Mutex::new(None),
        });

        let cancel = CancellationToken::new();
        let task = spawn_reaper_task(
            Arc::downgrade(&inner),
            config.effective_reaper_interval(),
            cancel.clone(),
        );
        *inner.reaper.lock() = Some(Reaper { cancel, task });

        info!(
            max_size = config.max_size,
            policy = %policy,
            default_ttl = ?config.default_ttl,
            "Cache engine started"
        );

        Self {
            inner,
            loads: LoadGroup::new(),
        }
    }

    // == Get ==
    /// Retrieves a live value by key and records the access.
    ///
    /// An expired entry found here is removed before reporting a miss.
    pub fn get(&self, key: &str) -> Option<V> {
        let inner = &self.inner;
        if inner.is_closed() {
            return None;
        }

        let lookup = inner.entries.get(key).map(|entry| {
            if entry.is_expired() {
                None
            } else {
                Some(entry.value.clone())
            }
        });

        match lookup {
            Some(Some(value)) => {
                inner.touch(key);
                inner.stats.record_hit();
                Some(value)
            }
            Some(None) => {
                inner.remove_expired(key);
                inner.stats.record_miss();
                None
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Set ==
    /// Stores a value, evicting entries first if a new key would overflow
    /// the bound.
    ///
    /// A `ttl` of `None` or zero falls back to the configured default TTL.
    /// Overwriting an existing key replaces value and expiry, counts as an
    /// access and never changes the size.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Option<Duration>) -> Result<()> {
        let inner = &self.inner;
        if inner.is_closed() {
            return Err(CacheError::CacheClosed);
        }
        let key = key.into();

        let _guard = inner.write_lock.lock();
        let exists = inner.entries.contains_key(&key);

        if !exists && inner.max_size > 0 {
            while inner.size.load(Ordering::Acquire) >= inner.max_size {
                let Some(victim) = inner.handler.select_eviction_candidate() else {
                    warn!(
                        key = %key,
                        max_size = inner.max_size,
                        "Cache is full and the eviction policy offered no candidate"
                    );
                    return Err(CacheError::MemoryLimitExceeded);
                };
                inner.evict_locked(&victim);
            }
        }

        let entry = CacheEntry::new(value, inner.effective_ttl(ttl));
        inner.entries.insert(key.clone(), entry);

        if exists {
            inner.handler.on_access(&key);
        } else {
            inner.size.fetch_add(1, Ordering::AcqRel);
            inner.handler.on_insert(&key);
        }

        Ok(())
    }

    // == Contains ==
    /// Checks for a live entry without recording an access.
    pub fn contains(&self, key: &str) -> bool {
        let inner = &self.inner;
        if inner.is_closed() {
            return false;
        }
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.is_expired(),
            None => return false,
        };
        if expired {
            inner.remove_expired(key);
            return false;
        }
        true
    }

    // == Delete ==
    /// Removes an entry by key. Absent keys and a closed engine are no-ops.
    pub fn delete(&self, key: &str) -> Result<()> {
        let inner = &self.inner;
        if inner.is_closed() {
            return Ok(());
        }
        let _guard = inner.write_lock.lock();
        if inner.entries.remove(key).is_some() {
            inner.handler.on_evict(key);
            inner.size.fetch_sub(1, Ordering::AcqRel);
        }
        Ok(())
    }

    // == Clear ==
    /// Removes every entry and resets eviction tracking.
    pub fn clear(&self) {
        let inner = &self.inner;
        if inner.is_closed() {
            return;
        }
        let _guard = inner.write_lock.lock();
        inner.entries.clear();
        inner.handler.reset();
        inner.size.store(0, Ordering::Release);
        debug!("Cache cleared");
    }

    // == Iteration ==
    /// Snapshot of live keys, optionally restricted to a prefix.
    pub fn keys(&self, prefix: Option<&str>) -> Vec<String> {
        self.collect_live(prefix, |key, _| key.clone())
    }

    /// Calls `f` for each live entry of a snapshot, stopping early when `f`
    /// returns false.
    ///
    /// The snapshot is taken before the first call, so `f` may use the cache.
    pub fn for_each<F>(&self, prefix: Option<&str>, mut f: F)
    where
        F: FnMut(&str, &V) -> bool,
    {
        for (key, value) in self.collect_live(prefix, |key, value| (key.clone(), value.clone())) {
            if !f(&key, &value) {
                break;
            }
        }
    }

    fn collect_live<R>(&self, prefix: Option<&str>, map: impl Fn(&String, &V) -> R) -> Vec<R> {
        let inner = &self.inner;
        if inner.is_closed() {
            return Vec::new();
        }

        let now = Instant::now();
        let mut live = Vec::new();
        let mut expired = Vec::new();
        for entry in inner.entries.iter() {
            if !prefix.map_or(true, |p| entry.key().starts_with(p)) {
                continue;
            }
            if entry.value().is_expired_at(now) {
                expired.push(entry.key().clone());
            } else {
                live.push(map(entry.key(), &entry.value().value));
            }
        }

        // shard guards are released, safe to take the write lock now
        for key in expired {
            inner.remove_expired(&key);
        }
        live
    }

    // == Size ==
    /// Current number of entries, 0 when closed.
    pub fn size(&self) -> usize {
        if self.inner.is_closed() {
            return 0;
        }
        self.inner.size.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    // == Load ==
    /// Returns the cached value for `key`, or runs `loader` once across all
    /// concurrent callers and caches its result with `ttl`.
    pub async fn get_or_load(
        &self,
        key: &str,
        loader: Option<Loader<V>>,
        ttl: Option<Duration>,
    ) -> Result<V> {
        self.loads.get_or_load(self, key, loader, ttl).await
    }

    // == Expiry ==
    /// Removes every expired entry now. Returns the number removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.purge_expired()
    }

    // == Close ==
    /// Closes the engine and stops the reaper. Safe to call repeatedly.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(reaper) = self.inner.reaper.lock().as_ref() {
            reaper.stop();
        }
        info!("Cache engine closed");
    }

    /// Whether the background reaper task is still alive.
    pub fn reaper_running(&self) -> bool {
        self.inner
            .reaper
            .lock()
            .as_ref()
            .is_some_and(Reaper::is_running)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.inner.stats.snapshot(self.size())
    }

    /// Policy in effect after applying the size rule.
    pub fn policy(&self) -> EvictionPolicy {
        self.inner.policy
    }

    pub fn max_size(&self) -> usize {
        self.inner.max_size
    }

    /// Number of keys the eviction handler currently tracks.
    pub fn tracked_keys(&self) -> usize {
        self.inner.handler.len()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> LoadTarget<V> for MemoryCacheEngine<V> {
    async fn lookup(&self, key: &str) -> Option<V> {
        self.get(key)
    }

    async fn populate(&self, key: &str, value: V, ttl: Option<Duration>) -> Result<()> {
        self.set(key, value, ttl)
    }
}
