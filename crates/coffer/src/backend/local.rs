//! Embedded in-process backend
//!
//! One [`LocalEngine`] exists per cache name, created lazily by the
//! connection registry with the resolved heap/TTL configuration and reused
//! for the cache's lifetime. Expiry is enforced by the engine's own
//! time-to-live policy (measured from write), eviction by its capacity
//! bound; both are the engine's concern, not ours.
//!
//! [`LocalBackend`] is the async bridge over the engine: every blocking
//! call is offloaded onto the tokio blocking pool and exposed as a future.
//! The remote backend needs no such bridge (its client is natively async).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::sync::Cache as MokaCache;

use super::{pattern_matches, Backend};
use crate::config::LocalCacheConfig;
use crate::error::{CacheError, Result};

/// Embedded engine instance for one cache name.
///
/// Payloads are held behind `Arc` so engine-internal clones stay cheap.
pub struct LocalEngine {
    name: String,
    store: MokaCache<String, Arc<Vec<u8>>>,
}

impl LocalEngine {
    /// Build an engine with the resolved configuration.
    pub fn new(name: impl Into<String>, config: &LocalCacheConfig) -> Self {
        let store = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.heap_size)
            .build();
        Self { name: name.into(), store }
    }

    /// Cache name this engine was created for.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, wire_key: &str) -> Option<Vec<u8>> {
        self.store.get(wire_key).map(|payload| payload.as_ref().clone())
    }

    fn put(&self, wire_key: String, payload: Vec<u8>) {
        self.store.insert(wire_key, Arc::new(payload));
    }

    fn exists(&self, wire_key: &str) -> bool {
        self.store.contains_key(wire_key)
    }

    fn scan(&self, pattern: &str) -> Vec<String> {
        self.store
            .iter()
            .filter(|(wire_key, _)| pattern_matches(pattern, wire_key.as_str()))
            .map(|(wire_key, _)| wire_key.as_ref().clone())
            .collect()
    }

    fn delete(&self, wire_key: &str) {
        self.store.invalidate(wire_key);
    }

    /// Drop every entry. Called once on manager shutdown.
    pub(crate) fn release(&self) {
        self.store.invalidate_all();
    }
}

/// Async bridge over a [`LocalEngine`].
///
/// Each raw operation runs on the blocking pool and resolves the returned
/// future with the call's result. The shared `closed` flag belongs to the
/// registry; once the manager is closed, every call fails with
/// [`CacheError::Closed`].
pub struct LocalBackend {
    engine: Arc<LocalEngine>,
    closed: Arc<AtomicBool>,
}

impl LocalBackend {
    /// Wrap `engine` for use behind the async facade.
    pub fn new(engine: Arc<LocalEngine>, closed: Arc<AtomicBool>) -> Self {
        Self { engine, closed }
    }

    fn guard(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(())
    }

    async fn offload<T, F>(&self, call: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&LocalEngine) -> T + Send + 'static,
    {
        self.guard()?;
        let engine = Arc::clone(&self.engine);
        tokio::task::spawn_blocking(move || call(&engine))
            .await
            .map_err(|err| CacheError::backend(format!("local engine task failed: {err}")))
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn raw_get(&self, wire_key: &str) -> Result<Option<Vec<u8>>> {
        let wire_key = wire_key.to_owned();
        self.offload(move |engine| engine.fetch(&wire_key)).await
    }

    async fn raw_put(&self, wire_key: &str, payload: Vec<u8>, _ttl: Duration) -> Result<()> {
        // Lifetime is enforced by the engine's own expiry policy, fixed at
        // construction; a fresh insert restarts it.
        let wire_key = wire_key.to_owned();
        self.offload(move |engine| engine.put(wire_key, payload)).await
    }

    async fn raw_exists(&self, wire_key: &str) -> Result<bool> {
        let wire_key = wire_key.to_owned();
        self.offload(move |engine| engine.exists(&wire_key)).await
    }

    async fn raw_scan(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = pattern.to_owned();
        self.offload(move |engine| engine.scan(&pattern)).await
    }

    async fn raw_delete(&self, wire_key: &str) -> Result<()> {
        let wire_key = wire_key.to_owned();
        self.offload(move |engine| engine.delete(&wire_key)).await
    }
}
