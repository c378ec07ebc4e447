//! Statistics decorators
//!
//! [`StatisticsDecorator`] and [`AsyncStatisticsDecorator`] wrap a cache
//! facade with identical signatures. After each delegated call they log
//! the outcome (hit/miss, put, contains-result, key count, removal, clear)
//! at the cache's configured [`LogLevel`] and count it in shared atomics.
//! They never alter the delegate's return value or error behavior, and
//! decorating a decorated cache yields the same external contract.
//!
//! Counters are shared via [`MetricsCollector`] clones, so every handle
//! the manager hands out for one cache name feeds the same
//! [`CacheStats`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::contract::{AsyncCache, Cache};
use crate::config::LogLevel;
use crate::error::Result;

/// Statistics snapshot for one cache name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Successful get operations.
    pub hits: u64,

    /// Get operations that found nothing (absent or expired).
    pub misses: u64,

    /// Put operations.
    pub puts: u64,

    /// Remove operations.
    pub removes: u64,

    /// Clear operations.
    pub clears: u64,
}

impl CacheStats {
    /// Hits over total accesses; `0.0` when nothing was accessed yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Total number of get operations (hits + misses).
    pub fn total_accesses(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Thread-safe counter set behind the decorators.
///
/// Clones share the underlying atomics, enabling one counter set per
/// cache name across any number of handles.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    hits: Arc<AtomicU64>,
    misses: Arc<AtomicU64>,
    puts: Arc<AtomicU64>,
    removes: Arc<AtomicU64>,
    clears: Arc<AtomicU64>,
}

impl Clone for MetricsCollector {
    fn clone(&self) -> Self {
        Self {
            hits: Arc::clone(&self.hits),
            misses: Arc::clone(&self.misses),
            puts: Arc::clone(&self.puts),
            removes: Arc::clone(&self.removes),
            clears: Arc::clone(&self.clears),
        }
    }
}

impl MetricsCollector {
    /// Create a collector with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn record_put(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    fn record_remove(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    fn record_clear(&self) {
        self.clears.fetch_add(1, Ordering::Relaxed);
    }

    /// Current statistics snapshot.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            puts: self.puts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            clears: self.clears.load(Ordering::Relaxed),
        }
    }
}

/// Route one event to the tracing level configured for the cache.
fn log_event(level: LogLevel, cache: &str, message: fmt::Arguments<'_>) {
    match level {
        LogLevel::Off => {}
        LogLevel::Trace => tracing::trace!(cache = %cache, "{}", message),
        LogLevel::Debug => tracing::debug!(cache = %cache, "{}", message),
        LogLevel::Info => tracing::info!(cache = %cache, "{}", message),
        LogLevel::Warn => tracing::warn!(cache = %cache, "{}", message),
        LogLevel::Error => tracing::error!(cache = %cache, "{}", message),
    }
}

/// Statistics decorator for the blocking facade.
pub struct StatisticsDecorator<K, V> {
    name: String,
    level: LogLevel,
    metrics: MetricsCollector,
    inner: Box<dyn Cache<K, V>>,
}

impl<K, V> StatisticsDecorator<K, V> {
    /// Decorate `inner` with a fresh counter set.
    pub fn new(name: impl Into<String>, level: LogLevel, inner: Box<dyn Cache<K, V>>) -> Self {
        Self::with_collector(name, level, MetricsCollector::new(), inner)
    }

    /// Decorate `inner`, feeding an existing (shared) counter set.
    pub(crate) fn with_collector(
        name: impl Into<String>,
        level: LogLevel,
        metrics: MetricsCollector,
        inner: Box<dyn Cache<K, V>>,
    ) -> Self {
        Self { name: name.into(), level, metrics, inner }
    }

    /// Current statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }
}

impl<K, V> Cache<K, V> for StatisticsDecorator<K, V>
where
    K: fmt::Debug + Send + Sync,
    V: Send + Sync,
{
    fn get(&self, key: &K) -> Result<Option<V>> {
        let value = self.inner.get(key)?;
        if value.is_some() {
            self.metrics.record_hit();
            log_event(self.level, &self.name, format_args!("got value for {key:?}"));
        } else {
            self.metrics.record_miss();
            log_event(self.level, &self.name, format_args!("missed value for {key:?}"));
        }
        Ok(value)
    }

    fn put(&self, key: &K, value: &V) -> Result<()> {
        self.inner.put(key, value)?;
        self.metrics.record_put();
        log_event(self.level, &self.name, format_args!("put value for {key:?}"));
        Ok(())
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        let present = self.inner.contains_key(key)?;
        let outcome = if present { "contained" } else { "missed" };
        log_event(self.level, &self.name, format_args!("{outcome} key {key:?}"));
        Ok(present)
    }

    fn keys(&self) -> Result<Vec<K>> {
        let keys = self.inner.keys()?;
        log_event(self.level, &self.name, format_args!("fetched {} active keys", keys.len()));
        Ok(keys)
    }

    fn remove(&self, key: &K) -> Result<()> {
        self.inner.remove(key)?;
        self.metrics.record_remove();
        log_event(self.level, &self.name, format_args!("removed value for {key:?}"));
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        self.inner.clear()?;
        self.metrics.record_clear();
        log_event(self.level, &self.name, format_args!("cleared"));
        Ok(())
    }
}

/// Statistics decorator for the asynchronous facade.
pub struct AsyncStatisticsDecorator<K, V> {
    name: String,
    level: LogLevel,
    metrics: MetricsCollector,
    inner: Box<dyn AsyncCache<K, V>>,
}

impl<K, V> AsyncStatisticsDecorator<K, V> {
    /// Decorate `inner` with a fresh counter set.
    pub fn new(name: impl Into<String>, level: LogLevel, inner: Box<dyn AsyncCache<K, V>>) -> Self {
        Self::with_collector(name, level, MetricsCollector::new(), inner)
    }

    /// Decorate `inner`, feeding an existing (shared) counter set.
    pub(crate) fn with_collector(
        name: impl Into<String>,
        level: LogLevel,
        metrics: MetricsCollector,
        inner: Box<dyn AsyncCache<K, V>>,
    ) -> Self {
        Self { name: name.into(), level, metrics, inner }
    }

    /// Current statistics snapshot.
    pub fn stats(&self) -> CacheStats {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl<K, V> AsyncCache<K, V> for AsyncStatisticsDecorator<K, V>
where
    K: fmt::Debug + Send + Sync,
    V: Send + Sync,
{
    async fn get(&self, key: &K) -> Result<Option<V>> {
        let value = self.inner.get(key).await?;
        if value.is_some() {
            self.metrics.record_hit();
            log_event(self.level, &self.name, format_args!("got value for {key:?}"));
        } else {
            self.metrics.record_miss();
            log_event(self.level, &self.name, format_args!("missed value for {key:?}"));
        }
        Ok(value)
    }

    async fn put(&self, key: &K, value: &V) -> Result<()> {
        self.inner.put(key, value).await?;
        self.metrics.record_put();
        log_event(self.level, &self.name, format_args!("put value for {key:?}"));
        Ok(())
    }

    async fn contains_key(&self, key: &K) -> Result<bool> {
        let present = self.inner.contains_key(key).await?;
        let outcome = if present { "contained" } else { "missed" };
        log_event(self.level, &self.name, format_args!("{outcome} key {key:?}"));
        Ok(present)
    }

    async fn keys(&self) -> Result<Vec<K>> {
        let keys = self.inner.keys().await?;
        log_event(self.level, &self.name, format_args!("fetched {} active keys", keys.len()));
        Ok(keys)
    }

    async fn remove(&self, key: &K) -> Result<()> {
        self.inner.remove(key).await?;
        self.metrics.record_remove();
        log_event(self.level, &self.name, format_args!("removed value for {key:?}"));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.inner.clear().await?;
        self.metrics.record_clear();
        log_event(self.level, &self.name, format_args!("cleared"));
        Ok(())
    }
}
