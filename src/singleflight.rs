//! Load Coordination Module
//!
//! Coalesces concurrent cache-miss loads for the same key so the loader runs
//! at most once per miss, whatever the number of callers.
//!
//! The first caller to miss starts a "flight": a spawned task that re-checks
//! the cache, runs the loader and populates the cache. Every concurrent caller
//! for that key awaits the same shared flight and receives a clone of its
//! result, success or error. Because the flight runs as its own task it
//! finishes and populates the cache even if every waiter gives up early.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{CacheError, Result};

/// Produces the value for a missing key. Receives the key being loaded.
pub type Loader<T> = Box<dyn FnOnce(String) -> BoxFuture<'static, Result<T>> + Send>;

/// Boxes an async closure into a [`Loader`].
///
/// # Example
/// ```ignore
/// let loader = loader_fn(|key| async move { Ok(format!("value for {}", key)) });
/// let value = cache.get_or_load("user:1", Some(loader), None).await?;
/// ```
pub fn loader_fn<T, F, Fut>(f: F) -> Loader<T>
where
    F: FnOnce(String) -> Fut + Send + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    Box::new(move |key| f(key).boxed())
}

/// The cache a [`LoadGroup`] reads from and populates.
#[async_trait]
pub trait LoadTarget<T>: Clone + Send + Sync + 'static {
    /// Returns the cached value, if present.
    async fn lookup(&self, key: &str) -> Option<T>;

    /// Stores a freshly loaded value.
    async fn populate(&self, key: &str, value: T, ttl: Option<Duration>) -> Result<()>;
}

type Flight<T> = Shared<BoxFuture<'static, Result<T>>>;

// == Load Group ==
/// Per-key load coordination shared by clones of one cache handle.
pub struct LoadGroup<T> {
    flights: Arc<Mutex<HashMap<String, Flight<T>>>>,
}

impl<T> Clone for LoadGroup<T> {
    fn clone(&self) -> Self {
        Self {
            flights: Arc::clone(&self.flights),
        }
    }
}

impl<T> Default for LoadGroup<T> {
    fn default() -> Self {
        Self {
            flights: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<T> std::fmt::Debug for LoadGroup<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadGroup")
            .field("in_flight", &self.flights.lock().len())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> LoadGroup<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys with a load currently running.
    pub fn in_flight(&self) -> usize {
        self.flights.lock().len()
    }

    /// Returns the value for `key` from `target`, loading it on a miss.
    ///
    /// Fails with [`CacheError::LoaderRequired`] when `loader` is `None`,
    /// even if the key is cached. A hit returns without any coordination.
    pub async fn get_or_load<C: LoadTarget<T>>(
        &self,
        target: &C,
        key: &str,
        loader: Option<Loader<T>>,
        ttl: Option<Duration>,
    ) -> Result<T> {
        let loader = loader.ok_or(CacheError::LoaderRequired)?;

        if let Some(value) = target.lookup(key).await {
            return Ok(value);
        }

        let flight = {
            let mut flights = self.flights.lock();
            match flights.get(key) {
                Some(flight) => flight.clone(),
                None => {
                    let flight = self.start_flight(target.clone(), key.to_string(), loader, ttl);
                    flights.insert(key.to_string(), flight.clone());
                    flight
                }
            }
        };

        flight.await
    }

    fn start_flight<C: LoadTarget<T>>(
        &self,
        target: C,
        key: String,
        loader: Loader<T>,
        ttl: Option<Duration>,
    ) -> Flight<T> {
        let flights = Arc::clone(&self.flights);
        // the caller still holds the flights lock, so this task cannot
        // deregister before the flight is registered
        let task = tokio::spawn(async move {
            let registration = FlightRegistration { flights, key };
            load_once(&target, &registration.key, loader, ttl).await
        });

        async move {
            task.await
                .unwrap_or_else(|err| Err(CacheError::loader(format!("load task failed: {}", err))))
        }
        .boxed()
        .shared()
    }
}

/// Removes a flight from its group when the flight task ends, including
/// when the loader panics and the task unwinds.
struct FlightRegistration<T> {
    flights: Arc<Mutex<HashMap<String, Flight<T>>>>,
    key: String,
}

impl<T> Drop for FlightRegistration<T> {
    fn drop(&mut self) {
        self.flights.lock().remove(&self.key);
    }
}

async fn load_once<T, C: LoadTarget<T>>(
    target: &C,
    key: &str,
    loader: Loader<T>,
    ttl: Option<Duration>,
) -> Result<T>
where
    T: Clone + Send + Sync + 'static,
{
    // another flight may have filled the key while this caller queued
    if let Some(value) = target.lookup(key).await {
        debug!(key, "Key populated while waiting, skipping load");
        return Ok(value);
    }

    debug!(key, "Loading missing key");
    let value = loader(key.to_string()).await?;
    target.populate(key, value.clone(), ttl).await?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone, Default)]
    struct MapTarget {
        values: Arc<Mutex<HashMap<String, u64>>>,
        fail_populate: bool,
    }

    #[async_trait]
    impl LoadTarget<u64> for MapTarget {
        async fn lookup(&self, key: &str) -> Option<u64> {
            self.values.lock().get(key).copied()
        }

        async fn populate(&self, key: &str, value: u64, _ttl: Option<Duration>) -> Result<()> {
            if self.fail_populate {
                return Err(CacheError::backend("store unavailable"));
            }
            self.values.lock().insert(key.to_string(), value);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_loader_required() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();
        let result = group.get_or_load(&target, "k", None, None).await;
        assert_eq!(result, Err(CacheError::LoaderRequired));
    }

    #[tokio::test]
    async fn test_hit_skips_loader() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();
        target.values.lock().insert("k".to_string(), 7);

        let loader = loader_fn(|_| async { Err(CacheError::loader("loader must not run on a hit")) });
        assert_eq!(group.get_or_load(&target, "k", Some(loader), None).await, Ok(7));
    }

    #[tokio::test]
    async fn test_miss_loads_and_populates() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();

        let loader = loader_fn(|key: String| async move { Ok(key.len() as u64) });
        assert_eq!(group.get_or_load(&target, "four", Some(loader), None).await, Ok(4));
        assert_eq!(target.values.lock().get("four"), Some(&4));
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_callers_share_one_load() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..32)
            .map(|_| {
                let group = group.clone();
                let target = target.clone();
                let calls = Arc::clone(&calls);
                tokio::spawn(async move {
                    let loader = loader_fn(move |_| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Ok(99)
                    });
                    group.get_or_load(&target, "hot", Some(loader), None).await
                })
            })
            .collect();

        for task in tasks {
            assert_eq!(task.await.unwrap(), Ok(99));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_loader_error_reaches_every_waiter() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();

        let slow_failure = loader_fn(|_| async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Err(CacheError::loader("upstream down"))
        });
        let never_runs = loader_fn(|_| async { Ok(1) });

        let (first, second) = tokio::join!(
            group.get_or_load(&target, "k", Some(slow_failure), None),
            group.get_or_load(&target, "k", Some(never_runs), None),
        );
        let expected = Err(CacheError::Loader("upstream down".to_string()));
        assert_eq!(first, expected);
        assert_eq!(second, expected);
        assert!(target.values.lock().is_empty());
        assert_eq!(group.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_populate_error_propagates() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget {
            fail_populate: true,
            ..MapTarget::default()
        };

        let loader = loader_fn(|_| async { Ok(5) });
        let result = group.get_or_load(&target, "k", Some(loader), None).await;
        assert!(matches!(result, Err(CacheError::Backend(_))));
    }

    async fn exploding_loader(_key: String) -> Result<u64> {
        panic!("loader exploded")
    }

    #[tokio::test]
    async fn test_panicking_loader_does_not_block_later_loads() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();

        let first = group
            .get_or_load(&target, "k", Some(loader_fn(exploding_loader)), None)
            .await;
        assert!(matches!(first, Err(CacheError::Loader(_))));
        assert_eq!(group.in_flight(), 0);

        let second = group
            .get_or_load(&target, "k", Some(loader_fn(|_| async { Ok(42) })), None)
            .await;
        assert_eq!(second, Ok(42));
        assert_eq!(target.values.lock().get("k"), Some(&42));
    }

    #[tokio::test]
    async fn test_abandoned_load_still_populates() {
        let group: LoadGroup<u64> = LoadGroup::new();
        let target = MapTarget::default();

        let loader = loader_fn(|_| async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            Ok(11)
        });
        let attempt = tokio::time::timeout(
            Duration::from_millis(5),
            group.get_or_load(&target, "k", Some(loader), None),
        )
        .await;
        assert!(attempt.is_err(), "caller gave up before the load finished");

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(target.values.lock().get("k"), Some(&11));
    }
}
