//! Shared remote store backend
//!
//! One [`RemoteConnection`] exists per distinct host, created lazily by the
//! connection registry and shared by every cache name pointing at that
//! host. The underlying `ConnectionManager` multiplexes concurrent requests
//! and reconnects on failure; both properties are the client's concern.
//!
//! Writes go through `SETEX` so every put refreshes the entry's lifetime.
//! Wire keys produced by the key codec are passed through literally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::Backend;
use crate::config::{ReadPreference, RemoteCacheConfig};
use crate::error::{CacheError, Result};

/// A live client/connection pair for one host.
pub struct RemoteConnection {
    host: String,
    read_preference: ReadPreference,
    manager: ConnectionManager,
}

impl RemoteConnection {
    /// Open a connection to the configured host.
    ///
    /// Connection failures propagate uncaught; this layer never retries
    /// (the manager inside reconnects on later use, but establishment is
    /// the caller's problem).
    pub async fn connect(config: &RemoteCacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.host.as_str())?;
        let manager = ConnectionManager::new(client).await?;
        tracing::debug!(
            host = %config.host,
            read_preference = ?config.read_preference,
            "connected to remote store"
        );
        Ok(Self {
            host: config.host.clone(),
            read_preference: config.read_preference,
            manager,
        })
    }

    /// Host this connection was opened against.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Read routing recorded at setup.
    pub fn read_preference(&self) -> ReadPreference {
        self.read_preference
    }
}

/// Backend adapter over a shared [`RemoteConnection`].
pub struct RemoteBackend {
    connection: Arc<RemoteConnection>,
    closed: Arc<AtomicBool>,
}

impl RemoteBackend {
    /// Wrap a registry-owned connection.
    pub fn new(connection: Arc<RemoteConnection>, closed: Arc<AtomicBool>) -> Self {
        Self { connection, closed }
    }

    fn conn(&self) -> Result<ConnectionManager> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        // ConnectionManager is a cheap handle onto the multiplexed
        // connection; commands need `&mut self`, so each call gets a clone.
        Ok(self.connection.manager.clone())
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn raw_get(&self, wire_key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn()?;
        let payload: Option<Vec<u8>> = conn.get(wire_key).await?;
        Ok(payload)
    }

    async fn raw_put(&self, wire_key: &str, payload: Vec<u8>, ttl: Duration) -> Result<()> {
        let mut conn = self.conn()?;
        // SETEX rejects a zero lifetime; clamp to the store's minimum.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(wire_key, payload, seconds).await?;
        Ok(())
    }

    async fn raw_exists(&self, wire_key: &str) -> Result<bool> {
        let mut conn = self.conn()?;
        let present: bool = conn.exists(wire_key).await?;
        Ok(present)
    }

    async fn raw_scan(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.conn()?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn raw_delete(&self, wire_key: &str) -> Result<()> {
        let mut conn = self.conn()?;
        conn.del::<_, ()>(wire_key).await?;
        Ok(())
    }
}
