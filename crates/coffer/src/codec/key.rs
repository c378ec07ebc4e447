//! Namespaced wire keys
//!
//! A wire key carries the cache name (the namespace) alongside the logical
//! key so that caches sharing a backend cannot observe each other's entries.
//!
//! Two wire formats exist:
//!
//! - Simple key types (`String`, `Uuid`, `i32`, `i64`) use the textual form
//!   `<namespace>/<key>`. Decoding strips the prefix and parses the rest.
//! - Composite key types use a JSON envelope `{"ns":"<namespace>","key":…}`.
//!   The `ns` field is declared first so the serialized text has a stable
//!   namespace prefix; the enumeration wildcard relies on it.
//!
//! The round-trip law `decode(ns, encode(ns, k)) == k` holds for every
//! supported key type; see the tests at the bottom of this module.

use std::fmt;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

/// Separator between namespace and textual key in the simple wire format.
pub const NAMESPACE_SEPARATOR: char = '/';

/// A type usable as a cache key.
///
/// Implementations exist for the simple types (`String`, `Uuid`, `i32`,
/// `i64`). Composite types opt in through the [`composite_key!`] macro,
/// which routes them through the JSON envelope format:
///
/// ```
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// struct SessionKey {
///     tenant: String,
///     shard: i32,
/// }
///
/// coffer::composite_key!(SessionKey);
/// ```
///
/// [`composite_key!`]: crate::composite_key
pub trait CacheKey: fmt::Debug + Send + Sync + Sized {
    /// Encode this key into its wire form under `namespace`.
    fn encode_wire(&self, namespace: &str) -> Result<String>;

    /// Decode a wire key back into the logical key.
    ///
    /// Fails with [`CacheError::CorruptEntry`] when `wire` does not carry
    /// `namespace` or its remainder does not parse as `Self`.
    fn decode_wire(namespace: &str, wire: &str) -> Result<Self>;

    /// Pattern matching every wire key under `namespace`.
    ///
    /// Used for enumeration and bulk clear. The pattern language is the
    /// backend's glob (`KEYS` for the remote store, prefix match locally);
    /// namespaces containing glob metacharacters are not escaped.
    fn wildcard(namespace: &str) -> String;
}

fn strip_namespace<'a>(namespace: &str, wire: &'a str) -> Result<&'a str> {
    wire.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix(NAMESPACE_SEPARATOR))
        .ok_or_else(|| CacheError::corrupt(wire, format!("missing namespace prefix '{namespace}'")))
}

macro_rules! simple_cache_key {
    ($ty:ty, $parse:expr) => {
        impl CacheKey for $ty {
            fn encode_wire(&self, namespace: &str) -> Result<String> {
                Ok(format!("{namespace}{NAMESPACE_SEPARATOR}{self}"))
            }

            fn decode_wire(namespace: &str, wire: &str) -> Result<Self> {
                let text = strip_namespace(namespace, wire)?;
                let parse: fn(&str) -> std::result::Result<$ty, String> = $parse;
                parse(text).map_err(|reason| CacheError::corrupt(wire, reason))
            }

            fn wildcard(namespace: &str) -> String {
                format!("{namespace}{NAMESPACE_SEPARATOR}*")
            }
        }
    };
}

simple_cache_key!(String, |text| Ok(text.to_owned()));
simple_cache_key!(uuid::Uuid, |text| uuid::Uuid::parse_str(text).map_err(|err| err.to_string()));
simple_cache_key!(i32, |text| text.parse().map_err(|err: std::num::ParseIntError| err.to_string()));
simple_cache_key!(i64, |text| text.parse().map_err(|err: std::num::ParseIntError| err.to_string()));

/// Serialized form of a composite wire key. `ns` must stay the first field:
/// the wildcard pattern is a prefix match over this text.
#[derive(Serialize)]
struct EnvelopeRef<'a, K> {
    ns: &'a str,
    key: &'a K,
}

#[derive(Deserialize)]
struct Envelope<K> {
    ns: String,
    key: K,
}

/// Encode a composite key as the JSON envelope `{"ns":…,"key":…}`.
pub fn encode_envelope<K: Serialize>(namespace: &str, key: &K) -> Result<String> {
    serde_json::to_string(&EnvelopeRef { ns: namespace, key })
        .map_err(|source| CacheError::Encoding { what: "composite key", source })
}

/// Decode a composite wire key, verifying its namespace.
pub fn decode_envelope<K: DeserializeOwned>(namespace: &str, wire: &str) -> Result<K> {
    let envelope: Envelope<K> = serde_json::from_str(wire)
        .map_err(|err| CacheError::corrupt(wire, err.to_string()))?;
    if envelope.ns != namespace {
        return Err(CacheError::corrupt(
            wire,
            format!("namespace mismatch: expected '{namespace}', found '{}'", envelope.ns),
        ));
    }
    Ok(envelope.key)
}

/// Wildcard over the serialized envelope: everything sharing the namespace
/// prefix. A textual prefix match, not a structural query; it is only as
/// stable as the serializer's field ordering, which this module pins.
pub fn envelope_wildcard(namespace: &str) -> String {
    let quoted = serde_json::Value::String(namespace.to_owned()).to_string();
    format!("{{\"ns\":{quoted},*")
}

/// Implements [`CacheKey`](crate::codec::CacheKey) for a composite
/// (structured) key type via the JSON envelope wire format.
///
/// The type must implement `serde::Serialize`, `serde::Deserialize`,
/// `Debug`, `Send` and `Sync`.
#[macro_export]
macro_rules! composite_key {
    ($ty:ty) => {
        impl $crate::codec::CacheKey for $ty {
            fn encode_wire(&self, namespace: &str) -> $crate::error::Result<String> {
                $crate::codec::encode_envelope(namespace, self)
            }

            fn decode_wire(namespace: &str, wire: &str) -> $crate::error::Result<Self> {
                $crate::codec::decode_envelope(namespace, wire)
            }

            fn wildcard(namespace: &str) -> String {
                $crate::codec::envelope_wildcard(namespace)
            }
        }
    };
}

/// Key codec bound to one cache's namespace.
pub struct KeyCodec<K> {
    namespace: String,
    _key: PhantomData<fn() -> K>,
}

impl<K: CacheKey> KeyCodec<K> {
    /// Create a codec for `namespace`.
    ///
    /// Fails with [`CacheError::InvalidArgument`] on an empty namespace:
    /// an empty prefix would collapse isolation between caches.
    pub fn new(namespace: impl Into<String>) -> Result<Self> {
        let namespace = namespace.into();
        if namespace.is_empty() {
            return Err(CacheError::invalid("cache name must not be empty"));
        }
        Ok(Self { namespace, _key: PhantomData })
    }

    /// The namespace this codec encodes under.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Encode a logical key into its wire form.
    pub fn encode(&self, key: &K) -> Result<String> {
        key.encode_wire(&self.namespace)
    }

    /// Decode a wire key back into the logical key.
    pub fn decode(&self, wire: &str) -> Result<K> {
        K::decode_wire(&self.namespace, wire)
    }

    /// Pattern matching every wire key of this namespace.
    pub fn wildcard(&self) -> String {
        K::wildcard(&self.namespace)
    }
}
