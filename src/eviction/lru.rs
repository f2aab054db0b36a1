//! LRU Handler Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use parking_lot::RwLock;

use super::{EvictionHandler, KeyList};

// == LRU Handler ==
/// Tracks access order for LRU eviction strategy.
///
/// - Front = Most recently used
/// - Back = Least recently used
#[derive(Debug, Default)]
pub struct LruHandler {
    order: RwLock<KeyList>,
}

impl LruHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionHandler for LruHandler {
    fn on_insert(&self, key: &str) {
        self.on_access(key);
    }

    /// Marks a key as recently used, tracking it if it was unknown.
    fn on_access(&self, key: &str) {
        let mut order = self.order.write();
        if !order.move_to_front(key) {
            order.push_front(key);
        }
    }

    fn on_evict(&self, key: &str) {
        self.order.write().remove(key);
    }

    fn select_eviction_candidate(&self) -> Option<String> {
        self.order.read().back().map(str::to_string)
    }

    fn reset(&self) {
        self.order.write().clear();
    }

    fn len(&self) -> usize {
        self.order.read().len()
    }
}
