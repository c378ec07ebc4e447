//! Storage backend adapters
//!
//! [`Backend`] is the seam between the cache facade and a concrete store.
//! Both adapters speak the same raw contract over wire keys and payload
//! bytes; the facade never knows which one it is talking to.
//!
//! - [`LocalBackend`]: one embedded moka engine per cache name, blocking
//!   calls offloaded to the tokio blocking pool.
//! - [`RemoteBackend`]: a multiplexed Redis connection shared by every
//!   cache pointing at the same host.

mod local;
mod remote;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;

pub use local::{LocalBackend, LocalEngine};
pub use remote::{RemoteBackend, RemoteConnection};

/// Raw operations a store must provide.
///
/// Every operation is a single request; there is no multi-step protocol and
/// no cross-operation lock. `ttl` on [`raw_put`] is advisory for backends
/// that enforce expiry at engine level (the local engine is built with its
/// TTL); the remote store applies it per entry via set-with-expiry.
///
/// [`raw_put`]: Backend::raw_put
#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the payload stored under `wire_key`, if any.
    async fn raw_get(&self, wire_key: &str) -> Result<Option<Vec<u8>>>;

    /// Store `payload` under `wire_key`, (re)starting its lifetime.
    async fn raw_put(&self, wire_key: &str, payload: Vec<u8>, ttl: Duration) -> Result<()>;

    /// Existence check without fetching the payload.
    async fn raw_exists(&self, wire_key: &str) -> Result<bool>;

    /// Enumerate live wire keys matching `pattern` (a snapshot; may be
    /// stale under concurrent writers by the time it returns).
    async fn raw_scan(&self, pattern: &str) -> Result<Vec<String>>;

    /// Delete the entry under `wire_key`; no error if absent.
    async fn raw_delete(&self, wire_key: &str) -> Result<()>;
}

/// Match a wire key against the glob patterns the key codecs generate:
/// a literal, or a literal prefix terminated by `*`.
pub(crate) fn pattern_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}
