//! Cache Module
//!
//! Concurrent in-memory caching with TTL expiration and pluggable eviction.

mod engine;
mod entry;
mod stats;


// Re-export public types
pub use engine::MemoryCacheEngine;
pub use entry::CacheEntry;
pub use stats::CacheStats;
pub(crate) use stats::StatsCounters;

// == Public Constants ==
/// Maximum allowed key length in bytes for keys arriving over HTTP
pub const MAX_KEY_LENGTH: usize = 256;
