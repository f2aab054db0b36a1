//! Eviction Module
//!
//! Interchangeable eviction strategies that track key lifecycle events and
//! nominate the next key to evict when a bounded cache is full.

mod arena;
mod fifo;
mod lfu;
mod lru;
mod noop;

use std::fmt;
use std::str::FromStr;

use crate::error::CacheError;

pub use arena::{KeyList, SlotArena, SlotId};
pub use fifo::FifoHandler;
pub use lfu::LfuHandler;
pub use lru::LruHandler;
pub use noop::NoopHandler;

// == Eviction Policy ==
/// Which strategy a cache uses to pick eviction candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// No bookkeeping, never nominates a candidate
    None,
    /// Least recently used
    #[default]
    Lru,
    /// Least frequently used, ties broken by insertion order
    Lfu,
    /// First in, first out
    Fifo,
}

impl EvictionPolicy {
    /// Applies the sizing rule: an unbounded cache (`max_size == 0`) never
    /// evicts, and a bounded cache never runs without a policy.
    pub fn effective(self, max_size: usize) -> Self {
        match (max_size, self) {
            (0, _) => EvictionPolicy::None,
            (_, EvictionPolicy::None) => EvictionPolicy::Lru,
            (_, policy) => policy,
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionPolicy::None => "none",
            EvictionPolicy::Lru => "lru",
            EvictionPolicy::Lfu => "lfu",
            EvictionPolicy::Fifo => "fifo",
        };
        f.write_str(name)
    }
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(EvictionPolicy::None),
            "lru" => Ok(EvictionPolicy::Lru),
            "lfu" => Ok(EvictionPolicy::Lfu),
            "fifo" => Ok(EvictionPolicy::Fifo),
            other => Err(CacheError::Config(format!(
                "unknown eviction policy '{}'",
                other
            ))),
        }
    }
}

// == Eviction Handler ==
/// Key lifecycle tracking for one eviction strategy.
///
/// Implementations synchronize internally, so every method takes `&self`.
pub trait EvictionHandler: Send + Sync + fmt::Debug {
    /// A new key was written to the cache.
    fn on_insert(&self, key: &str);

    /// An existing key was read or overwritten.
    fn on_access(&self, key: &str);

    /// A key left the cache (delete, eviction or expiry).
    fn on_evict(&self, key: &str);

    /// The key that should be evicted next, if any.
    fn select_eviction_candidate(&self) -> Option<String>;

    /// Forgets every tracked key.
    fn reset(&self);

    /// Number of tracked keys.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Factory ==
/// Creates the handler for `policy`.
pub fn new_handler(policy: EvictionPolicy) -> Box<dyn EvictionHandler> {
    match policy {
        EvictionPolicy::None => Box::new(NoopHandler),
        EvictionPolicy::Lru => Box::new(LruHandler::new()),
        EvictionPolicy::Lfu => Box::new(LfuHandler::new()),
        EvictionPolicy::Fifo => Box::new(FifoHandler::new()),
    }
}
