use super::EvictionHandler;

/// Handler for unbounded caches: tracks nothing, never nominates a key.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

impl EvictionHandler for NoopHandler {
    fn on_insert(&self, _key: &str) {}

    fn on_access(&self, _key: &str) {}

    fn on_evict(&self, _key: &str) {}

    fn select_eviction_candidate(&self) -> Option<String> {
        None
    }

    fn reset(&self) {}

    fn len(&self) -> usize {
        0
    }
}
