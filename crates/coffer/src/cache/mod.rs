//! Cache facades
//!
//! The public cache contract in two flavors plus the cross-cutting
//! statistics decorator:
//!
//! - [`AsyncCache`] / [`Cache`]: the operational contract (get, put,
//!   contains_key, keys, remove, clear), asynchronous and blocking.
//! - [`AsyncCacheExt`] / [`CacheExt`]: populate-on-miss convenience
//!   (`get_through`, `get_through_future`), blanket-implemented so it
//!   works on any handle, decorated or not.
//! - [`NamespacedCache`] / [`BridgedCache`]: the core implementations the
//!   manager assembles from codecs and a backend.
//! - [`AsyncStatisticsDecorator`] / [`StatisticsDecorator`]: transparent
//!   wrappers logging and counting each operation's outcome.
//!
//! Handles are cheap, stateless views over shared backend state: create
//! them freely, drop them freely. The connections they reference are owned
//! by the manager's registry.

mod async_core;
mod contract;
mod core;
mod stats;

pub use self::core::BridgedCache;
pub use async_core::NamespacedCache;
pub use contract::{AsyncCache, AsyncCacheExt, Cache, CacheExt};
pub use stats::{AsyncStatisticsDecorator, CacheStats, MetricsCollector, StatisticsDecorator};
