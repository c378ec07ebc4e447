//! Value payload codec
//!
//! Values cross the backend boundary as JSON bytes. The serializer is an
//! external collaborator; this codec only maps its failures onto the cache
//! error taxonomy: encode failures surface as [`CacheError::Encoding`],
//! decode failures as [`CacheError::CorruptEntry`], never as a miss.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CacheError, Result};

/// Value codec for one cache's value type.
pub struct ValueCodec<V> {
    _value: PhantomData<fn() -> V>,
}

impl<V> Default for ValueCodec<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> ValueCodec<V> {
    /// Create a codec for `V`.
    pub fn new() -> Self {
        Self { _value: PhantomData }
    }
}

impl<V: Serialize + DeserializeOwned> ValueCodec<V> {
    /// Encode a logical value into backend payload bytes.
    pub fn encode(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|source| CacheError::Encoding { what: "value", source })
    }

    /// Decode backend payload bytes into the logical value.
    ///
    /// `wire_key` is carried into the error so a corrupt entry can be
    /// located and removed.
    pub fn decode(&self, wire_key: &str, payload: &[u8]) -> Result<V> {
        serde_json::from_slice(payload)
            .map_err(|err| CacheError::corrupt(wire_key, err.to_string()))
    }
}
