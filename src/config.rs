//! Configuration Module
//!
//! Cache engine configuration, and the server configuration loaded from
//! environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::eviction::EvictionPolicy;

/// Reaper interval used when none (or an invalid one) is configured.
pub const DEFAULT_REAPER_INTERVAL: Duration = Duration::from_secs(5 * 60);

// == Cache Config ==
/// Parameters of one in-memory cache engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of live entries, 0 = unbounded
    pub max_size: usize,
    /// TTL applied when a write does not carry one, zero = never expire
    pub default_ttl: Duration,
    /// Requested eviction policy (see [`EvictionPolicy::effective`])
    pub eviction_policy: EvictionPolicy,
    /// How often the background reaper scans for expired entries
    pub reaper_interval: Duration,
}

impl CacheConfig {
    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn with_default_ttl(mut self, default_ttl: Duration) -> Self {
        self.default_ttl = default_ttl;
        self
    }

    pub fn with_eviction_policy(mut self, policy: EvictionPolicy) -> Self {
        self.eviction_policy = policy;
        self
    }

    pub fn with_reaper_interval(mut self, interval: Duration) -> Self {
        self.reaper_interval = interval;
        self
    }

    /// Reaper interval with the zero fallback applied.
    pub fn effective_reaper_interval(&self) -> Duration {
        if self.reaper_interval.is_zero() {
            DEFAULT_REAPER_INTERVAL
        } else {
            self.reaper_interval
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_size: 0,
            default_ttl: Duration::ZERO,
            eviction_policy: EvictionPolicy::Lru,
            reaper_interval: DEFAULT_REAPER_INTERVAL,
        }
    }
}

// == Server Config ==
/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Engine parameters
    pub cache: CacheConfig,
    /// HTTP server port
    pub server_port: u16,
    /// Namespace prepended to every key, empty = none
    pub key_prefix: String,
}

impl ServerConfig {
    /// Creates a new ServerConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `MAX_ENTRIES` - Maximum cache entries, 0 = unbounded (default: 1000)
    /// - `DEFAULT_TTL` - Default TTL in seconds, 0 = none (default: 300)
    /// - `EVICTION_POLICY` - `lru`, `lfu`, `fifo` or `none` (default: lru)
    /// - `REAPER_INTERVAL` - Expiry scan frequency in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `KEY_PREFIX` - Key namespace (default: empty)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let cache = CacheConfig {
            max_size: env_or("MAX_ENTRIES", defaults.cache.max_size),
            default_ttl: Duration::from_secs(env_or(
                "DEFAULT_TTL",
                defaults.cache.default_ttl.as_secs(),
            )),
            eviction_policy: env_or("EVICTION_POLICY", defaults.cache.eviction_policy),
            reaper_interval: Duration::from_secs(env_or(
                "REAPER_INTERVAL",
                defaults.cache.reaper_interval.as_secs(),
            )),
        };

        Self {
            cache,
            server_port: env_or("SERVER_PORT", defaults.server_port),
            key_prefix: env::var("KEY_PREFIX").unwrap_or(defaults.key_prefix),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig {
                max_size: 1000,
                default_ttl: Duration::from_secs(300),
                eviction_policy: EvictionPolicy::Lru,
                reaper_interval: DEFAULT_REAPER_INTERVAL,
            },
            server_port: 3000,
            key_prefix: String::new(),
        }
    }
}

/// Reads and parses `name`, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value '{}' for {}", raw, name);
            default
        }),
        Err(_) => default,
    }
}
