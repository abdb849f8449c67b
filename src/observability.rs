//! Metrics hooks for cache operations.
//!
//! Implement [`CacheMetrics`] to feed your monitoring system; every hook
//! receives the cache key and, where it applies, the operation duration. The
//! default method bodies log via the `log` crate, and [`NoOpMetrics`] (the
//! default wired into the read path) records nothing.

use std::time::Duration;

/// Trait for cache metrics collection.
pub trait CacheMetrics: Send + Sync {
    /// Record a fresh cache hit.
    fn record_hit(&self, key: &str, duration: Duration) {
        debug!("cache HIT: {} took {:?}", key, duration);
    }

    /// Record a stale hit: the cached value was served and a background
    /// revalidation was scheduled.
    fn record_stale_hit(&self, key: &str, duration: Duration) {
        debug!("cache STALE HIT: {} took {:?}", key, duration);
    }

    /// Record a miss (including malformed entries recovered as misses).
    fn record_miss(&self, key: &str, duration: Duration) {
        debug!("cache MISS: {} took {:?}", key, duration);
    }

    /// Record that a revalidation request was handed to the dispatcher.
    fn record_dispatch(&self, key: &str) {
        debug!("revalidation dispatched for {}", key);
    }

    /// Record an error.
    fn record_error(&self, key: &str, error: &str) {
        warn!("cache ERROR for {}: {}", key, error);
    }
}

/// Default metrics implementation (no-op).
#[derive(Clone, Default)]
pub struct NoOpMetrics;

impl CacheMetrics for NoOpMetrics {
    fn record_hit(&self, _key: &str, _duration: Duration) {}
    fn record_stale_hit(&self, _key: &str, _duration: Duration) {}
    fn record_miss(&self, _key: &str, _duration: Duration) {}
    fn record_dispatch(&self, _key: &str) {}
    fn record_error(&self, _key: &str, _error: &str) {}
}
