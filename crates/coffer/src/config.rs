//! Cache and manager configuration
//!
//! Configuration is a closed sum type: a cache is either [`Local`]
//! (embedded engine, bounded heap) or [`Remote`] (shared Redis store).
//! Consumers match on the variant explicitly; there is no trait hierarchy.
//!
//! All configuration is supplied at manager construction (or per call via
//! [`crate::manager::CacheContext`]) and is read-only once a handle has been
//! built from it.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//!
//! use coffer::config::{CacheConfig, LocalCacheConfig, ManagerConfig, RemoteCacheConfig};
//!
//! let config = ManagerConfig::new()
//!     .with_default_config(CacheConfig::Local(
//!         LocalCacheConfig::new().with_ttl(Duration::from_secs(30)).with_heap_size(500),
//!     ))
//!     .with_cache_config(
//!         "sessions",
//!         CacheConfig::Remote(RemoteCacheConfig::new().with_host("redis://cache.internal:6379/0")),
//!     );
//! # let _ = config;
//! ```
//!
//! [`Local`]: CacheConfig::Local
//! [`Remote`]: CacheConfig::Remote

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default entry lifetime, measured from the last write.
pub const DEFAULT_TTL: Duration = Duration::from_secs(1);

/// Default in-memory capacity bound of a local engine, in entries.
pub const DEFAULT_HEAP_SIZE: u64 = 100;

/// Default remote store when no host is configured.
pub const DEFAULT_REMOTE_HOST: &str = "redis://127.0.0.1:6379/0";

/// Verbosity of the statistics decorator.
///
/// `Off` disables decoration entirely; every other level is "active" and
/// routes events to the corresponding `tracing` level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// No statistics logging; the manager skips the decorator.
    Off,
    /// Log at `tracing::trace!`.
    Trace,
    /// Log at `tracing::debug!` (the default).
    #[default]
    Debug,
    /// Log at `tracing::info!`.
    Info,
    /// Log at `tracing::warn!`.
    Warn,
    /// Log at `tracing::error!`.
    Error,
}

/// Read routing for the remote backend.
///
/// Recorded on the connection and logged at setup. Actual replica routing is
/// the store deployment's concern; the shared multiplexed connection serves
/// both preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadPreference {
    /// Read from the upstream (primary) node.
    #[default]
    Upstream,
    /// Prefer replica reads where the deployment provides them.
    Replica,
}

/// Configuration of a cache backed by the embedded in-process engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalCacheConfig {
    /// In-memory capacity bound, in entries.
    pub heap_size: u64,

    /// Entry lifetime, measured from the last write (never sliding on read).
    pub ttl: Duration,

    /// Statistics decorator verbosity.
    pub log_level: LogLevel,
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self { heap_size: DEFAULT_HEAP_SIZE, ttl: DEFAULT_TTL, log_level: LogLevel::default() }
    }
}

impl LocalCacheConfig {
    /// Create a config with the built-in defaults (heap 100, TTL 1 s).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the in-memory capacity bound.
    pub fn with_heap_size(mut self, heap_size: u64) -> Self {
        self.heap_size = heap_size;
        self
    }

    /// Set the entry lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the statistics decorator verbosity.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

/// Configuration of a cache backed by the shared remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCacheConfig {
    /// Connection target, e.g. `redis://127.0.0.1:6379/0`.
    pub host: String,

    /// Entry lifetime; every put refreshes it via set-with-expiry.
    pub ttl: Duration,

    /// Upstream vs replica read routing.
    pub read_preference: ReadPreference,

    /// Statistics decorator verbosity.
    pub log_level: LogLevel,
}

impl Default for RemoteCacheConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_REMOTE_HOST.to_owned(),
            ttl: DEFAULT_TTL,
            read_preference: ReadPreference::default(),
            log_level: LogLevel::default(),
        }
    }
}

impl RemoteCacheConfig {
    /// Create a config pointing at the default local store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the connection target.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the entry lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the read routing preference.
    pub fn with_read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = read_preference;
        self
    }

    /// Set the statistics decorator verbosity.
    pub fn with_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }
}

/// Backend selection plus its settings, as one closed sum type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum CacheConfig {
    /// Embedded in-process engine, one instance per cache name.
    Local(LocalCacheConfig),
    /// Shared networked store, one connection per host.
    Remote(RemoteCacheConfig),
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::Local(LocalCacheConfig::default())
    }
}

impl CacheConfig {
    /// Local cache with built-in defaults.
    pub fn local() -> Self {
        Self::Local(LocalCacheConfig::default())
    }

    /// Remote cache pointing at `host`, other settings defaulted.
    pub fn remote(host: impl Into<String>) -> Self {
        Self::Remote(RemoteCacheConfig::default().with_host(host))
    }

    /// Entry lifetime of the configured backend.
    pub fn ttl(&self) -> Duration {
        match self {
            Self::Local(config) => config.ttl,
            Self::Remote(config) => config.ttl,
        }
    }

    /// Statistics decorator verbosity of the configured backend.
    pub fn log_level(&self) -> LogLevel {
        match self {
            Self::Local(config) => config.log_level,
            Self::Remote(config) => config.log_level,
        }
    }
}

/// Manager-wide configuration: a default plus per-name overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Used for every cache name without an entry in `per_name_config`.
    pub default_config: CacheConfig,

    /// Named configurations; an entry here beats any per-call override.
    pub per_name_config: HashMap<String, CacheConfig>,
}

impl ManagerConfig {
    /// Create a config with a local default and no named entries.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the manager-wide default.
    pub fn with_default_config(mut self, default_config: CacheConfig) -> Self {
        self.default_config = default_config;
        self
    }

    /// Pin a configuration to a cache name.
    pub fn with_cache_config(mut self, name: impl Into<String>, config: CacheConfig) -> Self {
        self.per_name_config.insert(name.into(), config);
        self
    }

    /// Resolve the configuration for `name`.
    ///
    /// Precedence: named entry, then the per-call override, then the
    /// manager default. A named entry deliberately wins over the override
    /// so deployment configuration cannot be bypassed at call sites.
    pub fn resolve<'a>(&'a self, name: &str, call_override: Option<&'a CacheConfig>) -> &'a CacheConfig {
        self.per_name_config
            .get(name)
            .or(call_override)
            .unwrap_or(&self.default_config)
    }
}
