//! Error types for the cache layer
//!
//! All fallible operations in this crate return [`CacheError`]. The taxonomy
//! separates caller mistakes (`InvalidArgument`, `TypeConflict`) from data
//! problems (`Encoding`, `CorruptEntry`) and infrastructure failures
//! (`Connection`, `Backend`).
//!
//! Two deliberate choices:
//!
//! - A payload that exists but cannot be decoded is [`CacheError::CorruptEntry`],
//!   never a silent miss. `Ok(None)` always means "no live entry".
//! - No variant is retried internally. Connection and backend errors are
//!   propagated uncaught; retry policy belongs to the caller.

use thiserror::Error;

/// Boxed error type accepted from value suppliers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Convenience alias used throughout the crate.
pub type Result<T, E = CacheError> = std::result::Result<T, E>;

/// Errors surfaced by cache handles and the cache manager.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A caller-supplied argument was unusable (e.g. an empty cache name).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The same cache name was requested with incompatible key/value types.
    #[error("cache '{name}' is already bound to {existing}, requested {requested}")]
    TypeConflict {
        /// Cache name the conflicting request was made for
        name: String,
        /// Type pair recorded by the first request
        existing: String,
        /// Type pair of the rejected request
        requested: String,
    },

    /// A key or value could not be serialized for the wire.
    #[error("failed to encode {what}")]
    Encoding {
        /// What was being encoded ("key", "value", "composite key")
        what: &'static str,
        /// Underlying serializer error
        #[source]
        source: serde_json::Error,
    },

    /// A stored payload or wire key exists but cannot be decoded.
    ///
    /// Distinct from a miss: the entry is present in the backend and its
    /// bytes are unusable. Callers typically treat this as data corruption
    /// (remove the entry, repopulate) rather than as an absent value.
    #[error("corrupt entry under '{wire_key}': {reason}")]
    CorruptEntry {
        /// Backend wire key of the offending entry
        wire_key: String,
        /// Decoder diagnostic
        reason: String,
    },

    /// The remote store connection failed or an operation on it errored.
    #[error("remote store error: {0}")]
    Connection(#[from] redis::RedisError),

    /// A local engine or runtime task failed.
    #[error("backend failure: {message}")]
    Backend {
        /// Diagnostic message
        message: String,
    },

    /// A populate-on-miss supplier failed; nothing was cached.
    #[error("value supplier failed: {0}")]
    Supplier(#[source] BoxError),

    /// The owning manager has been closed and its connections released.
    #[error("cache manager is closed")]
    Closed,
}

impl CacheError {
    /// Shorthand for [`CacheError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Shorthand for [`CacheError::CorruptEntry`].
    pub fn corrupt(wire_key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CorruptEntry { wire_key: wire_key.into(), reason: reason.into() }
    }

    /// Shorthand for [`CacheError::Backend`].
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend { message: message.into() }
    }
}
