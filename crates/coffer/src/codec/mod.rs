//! Wire codecs
//!
//! Two codecs sit between a cache handle and its backend:
//!
//! - [`KeyCodec`] maps a logical key into a wire key carrying the cache's
//!   namespace, and back. Two caches with different namespaces never observe
//!   each other's entries, even on a shared backend.
//! - [`ValueCodec`] maps logical values to backend payload bytes. Structural
//!   serialization is delegated to `serde_json` and treated as a black box.

mod key;
mod value;

pub use key::{
    decode_envelope, encode_envelope, envelope_wildcard, CacheKey, KeyCodec, NAMESPACE_SEPARATOR,
};
pub use value::ValueCodec;
