//! Cache store implementations.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

pub mod inmemory;

pub use inmemory::InMemoryStore;

/// Trait for the external cache store this layer reads through.
///
/// The storage engine itself (persistence, eviction, replication) is not
/// implemented here; the store is injected at construction and owned by the
/// host service. Implementations must be safe under concurrent reads and
/// writes to different keys and should tolerate concurrent writes to the
/// same key (last-write-wins is acceptable). No transactions are assumed
/// beyond atomic get/set on a single key.
///
/// **IMPORTANT:** All methods use `&self` to allow concurrent access.
/// Implementations should use interior mutability or external storage.
pub trait CacheStore: Send + Sync + Clone {
    /// Retrieve stored bytes by key.
    ///
    /// # Returns
    /// - `Ok(Some(bytes))` - Entry present
    /// - `Ok(None)` - No entry under this key
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<Vec<u8>>>> + Send;

    /// Store entry bytes under a key.
    ///
    /// # Arguments
    /// - `key`: Cache key
    /// - `value`: Encoded entry bytes
    /// - `ttl`: Hard retention bound. `None` keeps the entry until
    ///   overwritten or deleted; the read-through layer always passes `None`
    ///   because staleness is derived from the entry itself and stale
    ///   entries must remain readable.
    /// - `bypass_freshness`: Skip any freshness comparison the store would
    ///   otherwise perform before accepting the write.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
        bypass_freshness: bool,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove an entry.
    ///
    /// # Errors
    /// Returns `Err` if the store is unavailable.
    fn delete(&self, key: &str) -> impl Future<Output = Result<()>> + Send;

    /// Normalize a raw key into the key actually used for storage.
    ///
    /// The default is the SHA-256 hex fingerprint, which keeps keys at a
    /// fixed width regardless of how long the rendered arguments are.
    fn fetch_cache_key(&self, raw_key: &str) -> String {
        crate::key::fingerprint(raw_key)
    }

    /// Health check - verify the store is accessible.
    ///
    /// # Errors
    /// Returns `Err` if the store is not accessible.
    fn health_check(&self) -> impl Future<Output = Result<bool>> + Send {
        async { Ok(true) }
    }
}
