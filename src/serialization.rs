//! Postcard-based storage codec with versioned envelopes.
//!
//! Every entry written to a store is wrapped in an envelope carrying a magic
//! header and a schema version. Entries with a bad magic, a foreign schema
//! version, or a corrupted payload are reported as malformed and treated as
//! misses by the read path, which recomputes and overwrites them.
//!
//! Format:
//!
//! ```text
//! ┌─────────────────┬─────────────────┬──────────────────────────┐
//! │  MAGIC (4 bytes)│VERSION (4 bytes)│POSTCARD PAYLOAD (N bytes)│
//! └─────────────────┴─────────────────┴──────────────────────────┘
//!   "SWRK"              u32                postcard::to_allocvec(T)
//! ```

use crate::error::{Error, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Magic header identifying entries written by this layer.
pub const CACHE_MAGIC: [u8; 4] = *b"SWRK";

/// Current schema version.
///
/// Increment when making breaking changes to the stored entry shape. Entries
/// written under an older version are evicted and recomputed on next access.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// Versioned envelope for stored entries.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CacheEnvelope<T> {
    pub magic: [u8; 4],
    pub version: u32,
    pub payload: T,
}

impl<T> CacheEnvelope<T> {
    /// Create a new envelope with the current magic and version.
    pub fn new(payload: T) -> Self {
        Self {
            magic: CACHE_MAGIC,
            version: CURRENT_SCHEMA_VERSION,
            payload,
        }
    }
}

/// Serialize a value with its envelope for storage.
///
/// # Errors
///
/// Returns `Error::SerializationError` if postcard serialization fails.
pub fn encode_for_store<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let envelope = CacheEnvelope::new(value);
    postcard::to_allocvec(&envelope).map_err(|e| {
        error!("store serialization failed: {}", e);
        Error::SerializationError(e.to_string())
    })
}

/// Deserialize a value from stored bytes, validating magic and version.
///
/// # Errors
///
/// - `Error::DeserializationError`: corrupted payload
/// - `Error::MalformedCacheEntry`: bad magic or foreign schema version
pub fn decode_from_store<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: CacheEnvelope<T> = postcard::from_bytes(bytes)
        .map_err(|e| Error::DeserializationError(e.to_string()))?;

    if envelope.magic != CACHE_MAGIC {
        return Err(Error::MalformedCacheEntry(format!(
            "invalid magic: expected {:?}, got {:?}",
            CACHE_MAGIC, envelope.magic
        )));
    }

    if envelope.version != CURRENT_SCHEMA_VERSION {
        return Err(Error::MalformedCacheEntry(format!(
            "schema version mismatch: expected {}, found {}",
            CURRENT_SCHEMA_VERSION, envelope.version
        )));
    }

    Ok(envelope.payload)
}
