//! FIFO Handler Module
//!
//! Evicts keys in the order they were first inserted. Reads never reorder.

use parking_lot::RwLock;

use super::{EvictionHandler, KeyList};

/// First-in, first-out eviction tracking.
#[derive(Debug, Default)]
pub struct FifoHandler {
    order: RwLock<KeyList>,
}

impl FifoHandler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvictionHandler for FifoHandler {
    /// Duplicate inserts keep the original position.
    fn on_insert(&self, key: &str) {
        self.order.write().push_front(key);
    }

    fn on_access(&self, _key: &str) {}

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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_ignores_access() {
        let fifo = FifoHandler::new();
        fifo.on_insert("a");
        fifo.on_insert("b");
        fifo.on_insert("c");

        fifo.on_access("a");
        fifo.on_access("a");
        fifo.on_access("a");

        assert_eq!(fifo.select_eviction_candidate(), Some("a".to_string()));
    }

    #[test]
    fn test_fifo_duplicate_insert_preserves_order() {
        let fifo = FifoHandler::new();
        fifo.on_insert("a");
        fifo.on_insert("b");
        fifo.on_insert("a");

        assert_eq!(fifo.len(), 2);
        assert_eq!(fifo.select_eviction_candidate(), Some("a".to_string()));
        fifo.on_evict("a");
        assert_eq!(fifo.select_eviction_candidate(), Some("b".to_string()));
    }

    #[test]
    fn test_fifo_access_does_not_track_unknown_key() {
        let fifo = FifoHandler::new();
        fifo.on_access("ghost");
        assert!(fifo.is_empty());
        assert_eq!(fifo.select_eviction_candidate(), None);
    }

    #[test]
    fn test_fifo_reset() {
        let fifo = FifoHandler::new();
        fifo.on_insert("a");
        fifo.reset();
        assert!(fifo.is_empty());

        fifo.on_insert("b");
        assert_eq!(fifo.select_eviction_candidate(), Some("b".to_string()));
    }
}
