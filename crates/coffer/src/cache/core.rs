//! Blocking cache core
//!
//! [`BridgedCache`] is the blocking flavor of the facade: every operation
//! blocks on the corresponding async core operation through the manager's
//! [`RuntimeBridge`]. Local and remote caches look identical from here;
//! for the remote backend, both the blocking and the async path traverse
//! the same shared multiplexed connection.
//!
//! Must be used from threads that are not tokio runtime workers; callers
//! already inside an async context should hold the async facade instead.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::async_core::NamespacedCache;
use super::contract::{AsyncCache, Cache};
use crate::bridge::RuntimeBridge;
use crate::codec::CacheKey;
use crate::error::Result;

/// Blocking facade over an async cache core.
pub struct BridgedCache<K, V> {
    inner: NamespacedCache<K, V>,
    bridge: RuntimeBridge,
}

impl<K, V> BridgedCache<K, V> {
    /// Wrap `inner`, blocking through `bridge`.
    pub fn new(inner: NamespacedCache<K, V>, bridge: RuntimeBridge) -> Self {
        Self { inner, bridge }
    }
}

impl<K, V> Cache<K, V> for BridgedCache<K, V>
where
    K: CacheKey + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    fn get(&self, key: &K) -> Result<Option<V>> {
        self.bridge.block_for(self.inner.get(key))
    }

    fn put(&self, key: &K, value: &V) -> Result<()> {
        self.bridge.block_for(self.inner.put(key, value))
    }

    fn contains_key(&self, key: &K) -> Result<bool> {
        self.bridge.block_for(self.inner.contains_key(key))
    }

    fn keys(&self) -> Result<Vec<K>> {
        self.bridge.block_for(self.inner.keys())
    }

    fn remove(&self, key: &K) -> Result<()> {
        self.bridge.block_for(self.inner.remove(key))
    }

    fn clear(&self) -> Result<()> {
        self.bridge.block_for(self.inner.clear())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for cache::core.
    use std::sync::atomic::AtomicBool;
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::backend::{Backend, LocalBackend, LocalEngine};
    use crate::cache::contract::CacheExt;
    use crate::config::LocalCacheConfig;
    use crate::error::CacheError;

    fn bridged(name: &str) -> BridgedCache<String, i32> {
        let engine = Arc::new(LocalEngine::new(
            name,
            &LocalCacheConfig::new().with_ttl(Duration::from_secs(60)),
        ));
        let backend: Arc<dyn Backend> =
            Arc::new(LocalBackend::new(engine, Arc::new(AtomicBool::new(false))));
        let inner = NamespacedCache::new(name, backend, Duration::from_secs(60)).unwrap();
        BridgedCache::new(inner, RuntimeBridge::new().unwrap())
    }

    /// Validates `BridgedCache::put` behavior for the blocking round-trip
    /// scenario.
    ///
    /// Assertions:
    /// - Confirms the blocking facade observes the async core's state.
    #[test]
    fn test_blocking_round_trip() {
        let cache = bridged("sessions");

        cache.put(&"u1".to_string(), &42).unwrap();

        assert_eq!(cache.get(&"u1".to_string()).unwrap(), Some(42));
        assert!(cache.contains_key(&"u1".to_string()).unwrap());
        assert_eq!(cache.keys().unwrap(), vec!["u1".to_string()]);

        cache.remove(&"u1".to_string()).unwrap();
        assert_eq!(cache.get(&"u1".to_string()).unwrap(), None);
    }

    /// Validates `CacheExt::get_through` behavior for the blocking
    /// populate-on-miss scenario.
    ///
    /// Assertions:
    /// - Confirms a miss computes and stores the value.
    /// - Confirms a hit short-circuits the (failing) supplier.
    /// - Confirms supplier failure propagates and caches nothing.
    #[test]
    fn test_blocking_get_through() {
        let cache = bridged("sessions");
        let key = "u1".to_string();

        assert_eq!(cache.get_through(&key, || Ok(7)).unwrap(), 7);
        assert_eq!(cache.get_through(&key, || Err("must not run".into())).unwrap(), 7);

        let missing = "u2".to_string();
        let failed = cache.get_through(&missing, || Err("boom".into()));
        assert!(matches!(failed, Err(CacheError::Supplier(_))));
        assert_eq!(cache.get(&missing).unwrap(), None);
    }

    /// Validates `BridgedCache::clear` behavior for the blocking bulk
    /// delete scenario.
    ///
    /// Assertions:
    /// - Confirms `clear()` leaves the namespace empty.
    #[test]
    fn test_blocking_clear() {
        let cache = bridged("sessions");

        cache.put(&"k1".to_string(), &1).unwrap();
        cache.put(&"k2".to_string(), &2).unwrap();

        cache.clear().unwrap();

        assert!(cache.keys().unwrap().is_empty());
        assert_eq!(cache.get(&"k1".to_string()).unwrap(), None);
    }
}
