//! One cache contract, two interchangeable backends.
//!
//! `coffer` gives callers a uniform key-value cache API over an embedded
//! in-process engine (moka) and a shared networked store (Redis). Which
//! backend a named cache uses is pure configuration; calling code never
//! changes.
//!
//! # Architecture
//!
//! - [`manager::CacheManager`] resolves per-name configuration
//!   (named entry > per-call override > manager default), obtains backend
//!   resources through a connection registry that creates each
//!   engine/connection at most once, and hands out cache handles.
//! - [`codec`] gives every named cache a private namespace inside a shared
//!   backend: simple keys as `name/key`, composite keys as a JSON
//!   envelope.
//! - [`cache`] holds the sync and async facades, populate-on-miss
//!   convenience and the statistics decorator.
//! - [`backend`] adapts the uniform raw contract onto moka and Redis.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use coffer::cache::{AsyncCache, AsyncCacheExt};
//! use coffer::config::{CacheConfig, LocalCacheConfig};
//! use coffer::manager::{CacheContext, CacheManager};
//!
//! # async fn demo() -> coffer::error::Result<()> {
//! let manager = CacheManager::with_default(CacheConfig::Local(
//!     LocalCacheConfig::new().with_ttl(Duration::from_secs(30)),
//! ))?;
//!
//! let sessions = manager.get_async::<String, i64>("sessions", CacheContext::new()).await?;
//!
//! sessions.put(&"u1".to_string(), &42).await?;
//! assert_eq!(sessions.get(&"u1".to_string()).await?, Some(42));
//!
//! // Populate on miss; the supplier only runs when the key is absent.
//! let visits = sessions.get_through(&"u2".to_string(), || Ok(1)).await?;
//! # let _ = visits;
//!
//! manager.close().await;
//! # Ok(())
//! # }
//! ```
//!
//! # What this crate does not do
//!
//! No durability, no strong consistency, no atomic read-modify-write
//! across backends, and no retry/backoff/circuit breaking: backend errors
//! propagate uncaught and retry policy is the caller's responsibility.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod backend;
pub mod bridge;
pub mod cache;
pub mod codec;
pub mod config;
pub mod error;
pub mod manager;
pub mod registry;

// Re-export commonly used types and traits for convenience
// ------------------------
pub use cache::{
    AsyncCache, AsyncCacheExt, AsyncStatisticsDecorator, Cache, CacheExt, CacheStats,
    StatisticsDecorator,
};
pub use codec::{CacheKey, KeyCodec, ValueCodec};
pub use config::{
    CacheConfig, LocalCacheConfig, LogLevel, ManagerConfig, ReadPreference, RemoteCacheConfig,
};
pub use error::{BoxError, CacheError};
pub use manager::{CacheContext, CacheManager};
