//! Connection and engine registry
//!
//! The one piece of explicitly shared mutable state in the crate. It owns
//! every live backend resource:
//!
//! - local engines, keyed by cache name
//! - remote connections, keyed by host
//!
//! Both tables expose only atomic get-or-create: under concurrent first
//! use, at most one engine/connection per identity is ever created. Local
//! creation is synchronous, so a concurrent-map entry API suffices; remote
//! creation awaits a connect, so it is serialized behind an async lock
//! (creation is rare, correctness first).
//!
//! The registry also records the first `(key, value)` type pair requested
//! per cache name and rejects later requests with incompatible types.

use std::any::{type_name, TypeId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::backend::{LocalEngine, RemoteConnection};
use crate::config::{LocalCacheConfig, RemoteCacheConfig};
use crate::error::{CacheError, Result};

/// First-requested type pair for a cache name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct TypeBinding {
    key_type: TypeId,
    value_type: TypeId,
    key_name: &'static str,
    value_name: &'static str,
}

impl TypeBinding {
    fn of<K: 'static, V: 'static>() -> Self {
        Self {
            key_type: TypeId::of::<K>(),
            value_type: TypeId::of::<V>(),
            key_name: type_name::<K>(),
            value_name: type_name::<V>(),
        }
    }

    fn describe(&self) -> String {
        format!("<{}, {}>", self.key_name, self.value_name)
    }
}

/// Process-wide table of live backend resources, owned by one manager.
pub struct ConnectionRegistry {
    engines: DashMap<String, Arc<LocalEngine>>,
    remotes: Mutex<HashMap<String, Arc<RemoteConnection>>>,
    bindings: DashMap<String, TypeBinding>,
    engines_created: AtomicUsize,
    connections_created: AtomicUsize,
    closed: Arc<AtomicBool>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            engines: DashMap::new(),
            remotes: Mutex::new(HashMap::new()),
            bindings: DashMap::new(),
            engines_created: AtomicUsize::new(0),
            connections_created: AtomicUsize::new(0),
            closed: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Shared closed flag, checked by every backend built from this
    /// registry.
    pub(crate) fn closed_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.closed)
    }

    fn guard(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(CacheError::Closed);
        }
        Ok(())
    }

    /// Record or verify the type pair bound to `name`.
    pub fn bind<K: 'static, V: 'static>(&self, name: &str) -> Result<()> {
        let requested = TypeBinding::of::<K, V>();
        match self.bindings.entry(name.to_owned()) {
            Entry::Occupied(current) => {
                let existing = current.get();
                if existing.key_type != requested.key_type
                    || existing.value_type != requested.value_type
                {
                    return Err(CacheError::TypeConflict {
                        name: name.to_owned(),
                        existing: existing.describe(),
                        requested: requested.describe(),
                    });
                }
                Ok(())
            }
            Entry::Vacant(slot) => {
                slot.insert(requested);
                Ok(())
            }
        }
    }

    /// Get or create the engine for `name`.
    ///
    /// The configuration only matters on first use; later callers share
    /// the engine built then.
    pub fn local_engine(&self, name: &str, config: &LocalCacheConfig) -> Result<Arc<LocalEngine>> {
        self.guard()?;
        let engine = self
            .engines
            .entry(name.to_owned())
            .or_insert_with(|| {
                self.engines_created.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(
                    cache = %name,
                    heap_size = config.heap_size,
                    ttl = ?config.ttl,
                    "created local engine"
                );
                Arc::new(LocalEngine::new(name, config))
            })
            .clone();
        Ok(engine)
    }

    /// Get or create the connection for the config's host.
    pub async fn remote_connection(
        &self,
        config: &RemoteCacheConfig,
    ) -> Result<Arc<RemoteConnection>> {
        self.guard()?;
        let mut remotes = self.remotes.lock().await;
        if let Some(connection) = remotes.get(&config.host) {
            return Ok(Arc::clone(connection));
        }

        let connection = Arc::new(RemoteConnection::connect(config).await?);
        self.connections_created.fetch_add(1, Ordering::Relaxed);
        remotes.insert(config.host.clone(), Arc::clone(&connection));
        Ok(connection)
    }

    /// How many local engines have been created so far.
    pub fn engines_created(&self) -> usize {
        self.engines_created.load(Ordering::Relaxed)
    }

    /// How many remote connections have been opened so far.
    pub fn connections_created(&self) -> usize {
        self.connections_created.load(Ordering::Relaxed)
    }

    /// Release every held resource exactly once.
    ///
    /// Idempotent: the first call drains both tables and flips the shared
    /// closed flag; later calls are no-ops. Handles built earlier observe
    /// the flag and fail with [`CacheError::Closed`].
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        for entry in self.engines.iter() {
            entry.value().release();
        }
        self.engines.clear();

        let mut remotes = self.remotes.lock().await;
        let released = remotes.len();
        remotes.clear();

        tracing::debug!(connections = released, "connection registry closed");
    }
}
