//! In-memory cache store (default, thread-safe, async).
//!
//! Uses DashMap for lock-free concurrent access with per-key sharding.
//! Intended as the reference store for tests and single-process hosts;
//! production deployments inject their own [`CacheStore`] implementation.

use super::CacheStore;
use crate::entry::CacheEntry;
use crate::error::Result;
use crate::serialization::decode_from_store;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A stored slot with an optional hard expiration.
struct StoredSlot {
    data: Vec<u8>,
    expires_at: Option<Instant>,
}

impl StoredSlot {
    fn new(data: Vec<u8>, ttl: Option<Duration>) -> Self {
        let expires_at = ttl.map(|d| Instant::now() + d);
        StoredSlot { data, expires_at }
    }

    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|exp| Instant::now() > exp)
    }
}

/// Thread-safe async in-memory cache store.
///
/// Hard TTL expiration (when a caller sets one) is handled on access. Soft
/// staleness is not this store's concern; the read-through layer derives it
/// from the entries themselves.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    slots: Arc<DashMap<String, StoredSlot>>,
}

impl InMemoryStore {
    /// Create a new in-memory cache store.
    pub fn new() -> Self {
        InMemoryStore {
            slots: Arc::new(DashMap::new()),
        }
    }

    /// Current number of entries.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Remove every entry carrying the given invalidation tag.
    ///
    /// Entries that fail to decode are left in place; the read path already
    /// treats them as misses and overwrites them.
    ///
    /// Returns the number of entries removed.
    pub fn purge_tag(&self, tag: &str) -> u64 {
        let keys: Vec<String> = self
            .slots
            .iter()
            .filter(|slot| {
                decode_from_store::<CacheEntry>(&slot.data)
                    .map(|entry| entry.tags.contains(tag))
                    .unwrap_or(false)
            })
            .map(|slot| slot.key().clone())
            .collect();

        let mut removed = 0;
        for key in keys {
            if self.slots.remove(&key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("purged {} entries tagged {}", removed, tag);
        }
        removed
    }
}

impl CacheStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if let Some(slot) = self.slots.get(key) {
            if !slot.is_expired() {
                debug!("inmemory GET {} -> HIT", key);
                return Ok(Some(slot.data.clone()));
            }
        }

        // Drop the expired slot if one was there
        self.slots.remove(key);
        debug!("inmemory GET {} -> MISS", key);
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<Duration>,
        _bypass_freshness: bool,
    ) -> Result<()> {
        self.slots
            .insert(key.to_string(), StoredSlot::new(value, ttl));

        if let Some(d) = ttl {
            debug!("inmemory SET {} (ttl: {:?})", key, d);
        } else {
            debug!("inmemory SET {}", key);
        }

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.slots.remove(key);
        debug!("inmemory DELETE {}", key);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }
}
