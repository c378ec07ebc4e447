//! Async cache core
//!
//! [`NamespacedCache`] composes the key codec, the value codec and a
//! backend adapter into the asynchronous facade. It is a cheap, stateless
//! view: the backend it references is shared and owned by the registry.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::try_join_all;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::contract::AsyncCache;
use crate::backend::Backend;
use crate::codec::{CacheKey, KeyCodec, ValueCodec};
use crate::error::Result;

/// Namespaced view over a shared backend.
pub struct NamespacedCache<K, V> {
    name: String,
    keys: KeyCodec<K>,
    values: ValueCodec<V>,
    backend: Arc<dyn Backend>,
    ttl: Duration,
}

impl<K, V> NamespacedCache<K, V>
where
    K: CacheKey,
{
    /// Bind `backend` under the namespace `name`.
    pub fn new(name: impl Into<String>, backend: Arc<dyn Backend>, ttl: Duration) -> Result<Self> {
        let name = name.into();
        Ok(Self {
            keys: KeyCodec::new(name.clone())?,
            values: ValueCodec::new(),
            backend,
            ttl,
            name,
        })
    }

    /// Cache name, which is also the key namespace.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[async_trait]
impl<K, V> AsyncCache<K, V> for NamespacedCache<K, V>
where
    K: CacheKey + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Result<Option<V>> {
        let wire_key = self.keys.encode(key)?;
        match self.backend.raw_get(&wire_key).await? {
            Some(payload) => Ok(Some(self.values.decode(&wire_key, &payload)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, key: &K, value: &V) -> Result<()> {
        let wire_key = self.keys.encode(key)?;
        let payload = self.values.encode(value)?;
        self.backend.raw_put(&wire_key, payload, self.ttl).await
    }

    async fn contains_key(&self, key: &K) -> Result<bool> {
        let wire_key = self.keys.encode(key)?;
        self.backend.raw_exists(&wire_key).await
    }

    async fn keys(&self) -> Result<Vec<K>> {
        let wire_keys = self.backend.raw_scan(&self.keys.wildcard()).await?;
        let mut keys = Vec::with_capacity(wire_keys.len());
        for wire_key in wire_keys {
            // A shared keyspace can hold foreign or damaged wire keys; one
            // of them must not poison the whole enumeration.
            match self.keys.decode(&wire_key) {
                Ok(key) => keys.push(key),
                Err(err) => tracing::warn!(
                    cache = %self.name,
                    wire_key = %wire_key,
                    error = %err,
                    "skipping undecodable wire key during enumeration"
                ),
            }
        }
        Ok(keys)
    }

    async fn remove(&self, key: &K) -> Result<()> {
        let wire_key = self.keys.encode(key)?;
        self.backend.raw_delete(&wire_key).await
    }

    async fn clear(&self) -> Result<()> {
        let wire_keys = self.backend.raw_scan(&self.keys.wildcard()).await?;
        try_join_all(wire_keys.iter().map(|wire_key| self.backend.raw_delete(wire_key))).await?;
        Ok(())
    }
}
