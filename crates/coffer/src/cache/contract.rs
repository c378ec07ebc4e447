//! The cache contract
//!
//! Defines all operational methods to create, access, update and delete
//! mappings of key to value, in a blocking ([`Cache`]) and an asynchronous
//! ([`AsyncCache`]) flavor with identical semantics.
//!
//! A cache is not a map:
//!
//! - **Eviction**: the backend has a capacity constraint and may remove a
//!   mapping at any point in time, possibly before capacity is reached.
//! - **Expiry**: entries expire after their configured time-to-live. The
//!   API does not distinguish an absent mapping from an expired one; both
//!   read as `Ok(None)`.
//!
//! Populate-on-miss lives on the extension traits ([`CacheExt`],
//! [`AsyncCacheExt`]), blanket-implemented over every cache (including
//! boxed handles and decorators) so the convenience operations always
//! compose through the decorated call path.

use std::future::Future;

use async_trait::async_trait;

use crate::error::{BoxError, CacheError, Result};

/// Blocking cache facade.
///
/// Every operation is a single request against the backend; no
/// cross-operation lock is held and there is no multi-step protocol.
pub trait Cache<K, V>: Send + Sync {
    /// Retrieve the value currently mapped to `key`.
    ///
    /// `Ok(None)` covers both "never written" and "expired". A payload
    /// that exists but cannot be decoded is [`CacheError::CorruptEntry`].
    fn get(&self, key: &K) -> Result<Option<V>>;

    /// Associate `value` with `key`, overwriting any existing entry and
    /// restarting its time-to-live from this write.
    fn put(&self, key: &K, value: &V) -> Result<()>;

    /// Check whether a mapping for `key` is present, without fetching the
    /// value. Subject to the same expiry blind spot as [`get`](Self::get).
    fn contains_key(&self, key: &K) -> Result<bool>;

    /// Enumerate all currently live keys of this cache.
    ///
    /// A snapshot at scan time; it may be stale by the time it returns
    /// under concurrent writers.
    fn keys(&self) -> Result<Vec<K>>;

    /// Remove the mapping for `key`, if any. No error if absent.
    fn remove(&self, key: &K) -> Result<()>;

    /// Remove all mappings of this cache.
    ///
    /// Implemented as scan-then-delete; not atomic with respect to a
    /// concurrent `put`, which may survive or be deleted depending on
    /// timing.
    fn clear(&self) -> Result<()>;
}

/// Asynchronous cache facade. Same contract as [`Cache`], returning
/// futures of the same result types.
#[async_trait]
pub trait AsyncCache<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Retrieve the value currently mapped to `key`.
    ///
    /// `Ok(None)` covers both "never written" and "expired". A payload
    /// that exists but cannot be decoded is [`CacheError::CorruptEntry`].
    async fn get(&self, key: &K) -> Result<Option<V>>;

    /// Associate `value` with `key`, overwriting any existing entry and
    /// restarting its time-to-live from this write.
    async fn put(&self, key: &K, value: &V) -> Result<()>;

    /// Check whether a mapping for `key` is present, without fetching the
    /// value.
    async fn contains_key(&self, key: &K) -> Result<bool>;

    /// Enumerate all currently live keys of this cache (snapshot).
    async fn keys(&self) -> Result<Vec<K>>;

    /// Remove the mapping for `key`, if any. No error if absent.
    async fn remove(&self, key: &K) -> Result<()>;

    /// Remove all mappings of this cache (scan-then-delete, not atomic).
    async fn clear(&self) -> Result<()>;
}

/// Populate-on-miss for the blocking facade.
///
/// No single-flight deduplication: N concurrent misses on one key each
/// invoke the supplier and each write the result; the last put wins.
/// Callers needing stampede protection must add per-key in-flight tracking
/// themselves.
pub trait CacheExt<K, V>: Cache<K, V> {
    /// Return the cached value, or compute, store and return it.
    ///
    /// If `supplier` fails, the failure propagates as
    /// [`CacheError::Supplier`] and nothing is cached.
    fn get_through<F>(&self, key: &K, supplier: F) -> Result<V>
    where
        F: FnOnce() -> std::result::Result<V, BoxError>,
    {
        if let Some(value) = self.get(key)? {
            return Ok(value);
        }
        let value = supplier().map_err(CacheError::Supplier)?;
        self.put(key, &value)?;
        Ok(value)
    }
}

impl<K, V, T> CacheExt<K, V> for T where T: Cache<K, V> + ?Sized {}

/// Populate-on-miss for the asynchronous facade.
///
/// Same semantics and the same stampede exposure as [`CacheExt`], composed
/// without blocking.
#[async_trait]
pub trait AsyncCacheExt<K, V>: AsyncCache<K, V>
where
    K: Send + Sync,
    V: Send + Sync,
{
    /// Return the cached value, or compute, store and return it.
    async fn get_through<F>(&self, key: &K, supplier: F) -> Result<V>
    where
        F: FnOnce() -> std::result::Result<V, BoxError> + Send,
    {
        self.get_through_future(key, move || async move { supplier() }).await
    }

    /// Asynchronous equivalent of [`get_through`](Self::get_through): the
    /// supplier produces a future, composed without blocking.
    async fn get_through_future<F, Fut>(&self, key: &K, supplier: F) -> Result<V>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<V, BoxError>> + Send,
    {
        if let Some(value) = self.get(key).await? {
            return Ok(value);
        }
        let value = supplier().await.map_err(CacheError::Supplier)?;
        self.put(key, &value).await?;
        Ok(value)
    }
}

#[async_trait]
impl<K, V, T> AsyncCacheExt<K, V> for T
where
    K: Send + Sync,
    V: Send + Sync,
    T: AsyncCache<K, V> + ?Sized,
{
}
