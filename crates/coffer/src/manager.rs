//! Cache manager
//!
//! The entry point of the crate. [`CacheManager`] resolves per-name
//! configuration, obtains backend resources through its connection
//! registry (creating each engine/connection at most once), assembles the
//! codecs into a facade and wraps it with the statistics decorator unless
//! logging is disabled.
//!
//! Repeated requests for the same name reuse the same connection state but
//! may return distinct handle instances with identical observable
//! behavior.
//!
//! # Examples
//!
//! ```no_run
//! use coffer::cache::{AsyncCache, AsyncCacheExt};
//! use coffer::manager::{CacheContext, CacheManager};
//!
//! # async fn demo() -> coffer::error::Result<()> {
//! let manager = CacheManager::new()?;
//!
//! let sessions = manager.get_async::<String, i64>("sessions", CacheContext::new()).await?;
//! sessions.put(&"u1".to_string(), &42).await?;
//!
//! let count = sessions
//!     .get_through(&"visits".to_string(), || Ok(1))
//!     .await?;
//! # let _ = count;
//! manager.close().await;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::backend::{Backend, LocalBackend, RemoteBackend};
use crate::bridge::RuntimeBridge;
use crate::cache::{
    AsyncCache, AsyncStatisticsDecorator, BridgedCache, Cache, CacheStats, MetricsCollector,
    NamespacedCache, StatisticsDecorator,
};
use crate::codec::CacheKey;
use crate::config::{CacheConfig, LogLevel, ManagerConfig};
use crate::error::{CacheError, Result};
use crate::registry::ConnectionRegistry;

/// Per-call options for a cache request.
///
/// Carries an optional default-config override. A named entry in the
/// manager's [`ManagerConfig`] always beats this override; it only applies
/// to names the manager has no configuration for.
#[derive(Debug, Clone, Default)]
pub struct CacheContext {
    default_config: Option<CacheConfig>,
}

impl CacheContext {
    /// Context without an override; the manager default applies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context overriding the manager default for this call.
    pub fn of_default(config: CacheConfig) -> Self {
        Self { default_config: Some(config) }
    }

    fn override_config(&self) -> Option<&CacheConfig> {
        self.default_config.as_ref()
    }
}

/// Resolves configuration, owns backend resources, builds cache handles.
pub struct CacheManager {
    config: ManagerConfig,
    registry: ConnectionRegistry,
    bridge: RuntimeBridge,
    stats: DashMap<String, MetricsCollector>,
}

impl CacheManager {
    /// Manager with a local default configuration.
    pub fn new() -> Result<Self> {
        Self::with_config(ManagerConfig::default())
    }

    /// Manager with the given default and no named configurations.
    pub fn with_default(default_config: CacheConfig) -> Result<Self> {
        Self::with_config(ManagerConfig::new().with_default_config(default_config))
    }

    /// Manager with a full configuration (default + per-name entries).
    pub fn with_config(config: ManagerConfig) -> Result<Self> {
        Ok(Self {
            config,
            registry: ConnectionRegistry::new(),
            bridge: RuntimeBridge::new()?,
            stats: DashMap::new(),
        })
    }

    /// Get or create the asynchronous cache `name`.
    ///
    /// Fails with [`CacheError::TypeConflict`] if `name` was requested
    /// before with different key/value types, and with
    /// [`CacheError::Closed`] after [`close`](Self::close).
    pub async fn get_async<K, V>(
        &self,
        name: &str,
        context: CacheContext,
    ) -> Result<Box<dyn AsyncCache<K, V>>>
    where
        K: CacheKey + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let (core, level) = self.build_core::<K, V>(name, &context).await?;
        Ok(match level {
            LogLevel::Off => Box::new(core),
            active => Box::new(AsyncStatisticsDecorator::with_collector(
                name,
                active,
                self.collector(name),
                Box::new(core),
            )),
        })
    }

    /// Get or create the blocking cache `name`.
    ///
    /// The handle blocks on the manager's runtime bridge; call it from
    /// threads that are not tokio runtime workers. Inside an async
    /// context, use [`get_async`](Self::get_async) instead.
    pub fn get_sync<K, V>(&self, name: &str, context: CacheContext) -> Result<Box<dyn Cache<K, V>>>
    where
        K: CacheKey + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        let (core, level) = self.bridge.block_for(self.build_core::<K, V>(name, &context))?;
        let bridged = BridgedCache::new(core, self.bridge.clone());
        Ok(match level {
            LogLevel::Off => Box::new(bridged),
            active => Box::new(StatisticsDecorator::with_collector(
                name,
                active,
                self.collector(name),
                Box::new(bridged),
            )),
        })
    }

    async fn build_core<K, V>(
        &self,
        name: &str,
        context: &CacheContext,
    ) -> Result<(NamespacedCache<K, V>, LogLevel)>
    where
        K: CacheKey + 'static,
        V: Serialize + DeserializeOwned + Send + Sync + 'static,
    {
        if name.is_empty() {
            return Err(CacheError::invalid("cache name must not be empty"));
        }
        self.registry.bind::<K, V>(name)?;
        let config = self.config.resolve(name, context.override_config());
        let closed = self.registry.closed_flag();

        match config {
            CacheConfig::Local(local) => {
                let engine = self.registry.local_engine(name, local)?;
                let backend: Arc<dyn Backend> = Arc::new(LocalBackend::new(engine, closed));
                Ok((NamespacedCache::new(name, backend, local.ttl)?, local.log_level))
            }
            CacheConfig::Remote(remote) => {
                let connection = self.registry.remote_connection(remote).await?;
                let backend: Arc<dyn Backend> = Arc::new(RemoteBackend::new(connection, closed));
                Ok((NamespacedCache::new(name, backend, remote.ttl)?, remote.log_level))
            }
        }
    }

    fn collector(&self, name: &str) -> MetricsCollector {
        self.stats.entry(name.to_owned()).or_default().clone()
    }

    /// Statistics of the named cache, if it was ever decorated.
    pub fn stats(&self, name: &str) -> Option<CacheStats> {
        self.stats.get(name).map(|collector| collector.snapshot())
    }

    /// How many local engines this manager has created.
    pub fn engines_created(&self) -> usize {
        self.registry.engines_created()
    }

    /// How many remote connections this manager has opened.
    pub fn connections_created(&self) -> usize {
        self.registry.connections_created()
    }

    /// Release every held connection and engine exactly once.
    ///
    /// Idempotent. Handles created earlier fail with
    /// [`CacheError::Closed`] on their next backend use; new `get_*` calls
    /// fail immediately.
    pub async fn close(&self) {
        self.registry.close().await;
    }

    /// Blocking variant of [`close`](Self::close), for shutdown paths
    /// outside any runtime.
    pub fn close_blocking(&self) {
        self.bridge.block_for(self.close());
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for manager.
    use std::time::Duration;

    use super::*;
    use crate::cache::AsyncCacheExt;
    use crate::config::LocalCacheConfig;

    fn local(ttl_secs: u64) -> CacheConfig {
        CacheConfig::Local(LocalCacheConfig::new().with_ttl(Duration::from_secs(ttl_secs)))
    }

    /// Validates `CacheManager::get_async` behavior for the engine reuse
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms two handles for one name share one engine (creation
    ///   counter stays at 1) and observe each other's writes.
    #[tokio::test]
    async fn test_handles_share_engine() {
        let manager = CacheManager::new().unwrap();

        let first = manager
            .get_async::<String, i32>("sessions", CacheContext::of_default(local(60)))
            .await
            .unwrap();
        let second = manager
            .get_async::<String, i32>("sessions", CacheContext::of_default(local(60)))
            .await
            .unwrap();

        first.put(&"k".to_string(), &1).await.unwrap();
        assert_eq!(second.get(&"k".to_string()).await.unwrap(), Some(1));
        assert_eq!(manager.engines_created(), 1);
    }

    /// Validates `CacheManager::get_async` behavior for the type conflict
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms requesting one name with different value types fails
    ///   with `TypeConflict`.
    #[tokio::test]
    async fn test_type_conflict() {
        let manager = CacheManager::new().unwrap();

        manager.get_async::<String, i32>("sessions", CacheContext::new()).await.unwrap();

        let conflict = manager
            .get_async::<String, String>("sessions", CacheContext::new())
            .await;
        assert!(matches!(conflict, Err(CacheError::TypeConflict { .. })));
    }

    /// Validates `CacheManager::get_async` behavior for the config
    /// precedence scenario.
    ///
    /// Assertions:
    /// - Confirms the named config (long TTL) beats the per-call override
    ///   (1 s TTL): the entry survives past the override's lifetime.
    /// - Confirms the override applies to an unlisted name: its entry
    ///   expires.
    #[tokio::test]
    async fn test_named_config_beats_override() {
        let manager = CacheManager::with_config(
            ManagerConfig::new()
                .with_default_config(local(60))
                .with_cache_config("pinned", local(60)),
        )
        .unwrap();

        let pinned = manager
            .get_async::<String, i32>("pinned", CacheContext::of_default(local(1)))
            .await
            .unwrap();
        let free = manager
            .get_async::<String, i32>("free", CacheContext::of_default(local(1)))
            .await
            .unwrap();

        pinned.put(&"k".to_string(), &1).await.unwrap();
        free.put(&"k".to_string(), &1).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1300)).await;

        assert_eq!(pinned.get(&"k".to_string()).await.unwrap(), Some(1));
        assert_eq!(free.get(&"k".to_string()).await.unwrap(), None);
    }

    /// Validates `CacheManager::stats` behavior for the decorated handle
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms decorated operations feed the per-name counters.
    /// - Confirms an undecorated cache (`LogLevel::Off`) records nothing.
    #[tokio::test]
    async fn test_stats_follow_decoration() {
        let manager = CacheManager::new().unwrap();

        let decorated = manager
            .get_async::<String, i32>("observed", CacheContext::new())
            .await
            .unwrap();
        decorated.put(&"k".to_string(), &1).await.unwrap();
        decorated.get(&"k".to_string()).await.unwrap();
        decorated.get(&"missing".to_string()).await.unwrap();

        let stats = manager.stats("observed").unwrap();
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);

        let silent_config = CacheConfig::Local(
            LocalCacheConfig::new()
                .with_ttl(Duration::from_secs(60))
                .with_log_level(LogLevel::Off),
        );
        let silent = manager
            .get_async::<String, i32>("silent", CacheContext::of_default(silent_config))
            .await
            .unwrap();
        silent.put(&"k".to_string(), &1).await.unwrap();

        assert!(manager.stats("silent").is_none());
    }

    /// Validates `CacheManager::close` behavior for the shutdown scenario.
    ///
    /// Assertions:
    /// - Confirms close is idempotent.
    /// - Confirms existing handles fail with `Closed` after shutdown.
    /// - Confirms new requests fail with `Closed`.
    #[tokio::test]
    async fn test_close_invalidates_handles() {
        let manager = CacheManager::new().unwrap();
        let cache = manager
            .get_async::<String, i32>("sessions", CacheContext::new())
            .await
            .unwrap();

        cache.put(&"k".to_string(), &1).await.unwrap();

        manager.close().await;
        manager.close().await;

        assert!(matches!(cache.get(&"k".to_string()).await, Err(CacheError::Closed)));
        let denied = manager.get_async::<String, i32>("sessions", CacheContext::new()).await;
        assert!(matches!(denied, Err(CacheError::Closed)));
    }

    /// Validates `AsyncCacheExt::get_through` behavior through a
    /// manager-built (decorated) handle.
    ///
    /// Assertions:
    /// - Confirms populate-on-miss composes with the decorator: the miss,
    ///   the put and the subsequent hit are all counted.
    #[tokio::test]
    async fn test_get_through_composes_with_decorator() {
        let manager = CacheManager::new().unwrap();
        let cache = manager
            .get_async::<String, i32>("through", CacheContext::of_default(local(60)))
            .await
            .unwrap();

        let value = cache.get_through(&"k".to_string(), || Ok(5)).await.unwrap();
        assert_eq!(value, 5);
        let value = cache
            .get_through(&"k".to_string(), || Err("must not run".into()))
            .await
            .unwrap();
        assert_eq!(value, 5);

        let stats = manager.stats("through").unwrap();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.hits, 1);
    }
}
