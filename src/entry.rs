//! Cache entry model and freshness derivation.
//!
//! An entry's status is never stored; it is derived from `stored_at` plus the
//! revalidation window against the current clock. Entries with
//! [`RevalidatePolicy::Never`] are terminal: once written they are never
//! considered stale and never trigger a background refresh.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default revalidation window in seconds when the caller does not choose one.
pub const DEFAULT_REVALIDATE_SECS: u32 = 60;

/// Entry kind marker for values produced by cached computations.
pub const FETCH_KIND: &str = "FETCH";

/// Revalidation policy for a cache entry.
///
/// The JSON wire representation is `number | false` (see [`wire`]); the
/// stored representation is the plain derived one, which keeps the postcard
/// envelope self-contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevalidatePolicy {
    /// The entry becomes stale this many seconds after it was stored.
    After(u32),
    /// The entry is never considered stale.
    Never,
}

impl Default for RevalidatePolicy {
    fn default() -> Self {
        RevalidatePolicy::After(DEFAULT_REVALIDATE_SECS)
    }
}

impl RevalidatePolicy {
    /// Reject the zero window: a policy must be `Never` or a positive number
    /// of seconds.
    pub fn validate(&self) -> Result<()> {
        match self {
            RevalidatePolicy::After(0) => Err(Error::ConfigError(
                "revalidate window must be Never or greater than zero".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// The staleness window in seconds, or `None` for `Never`.
    pub fn window_secs(&self) -> Option<u32> {
        match self {
            RevalidatePolicy::After(secs) => Some(*secs),
            RevalidatePolicy::Never => None,
        }
    }
}

/// JSON wire codec for [`RevalidatePolicy`]: a positive number of seconds or
/// the literal `false`. `true` and `0` are rejected.
///
/// Use with `#[serde(with = "crate::entry::wire")]` on wire-message fields.
pub mod wire {
    use super::RevalidatePolicy;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(policy: &RevalidatePolicy, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match policy {
            RevalidatePolicy::After(secs) => serializer.serialize_u32(*secs),
            RevalidatePolicy::Never => serializer.serialize_bool(false),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<RevalidatePolicy, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Secs(u32),
            Flag(bool),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Secs(0) => Err(D::Error::custom(
                "revalidate must be false or greater than zero",
            )),
            Raw::Secs(secs) => Ok(RevalidatePolicy::After(secs)),
            Raw::Flag(false) => Ok(RevalidatePolicy::Never),
            Raw::Flag(true) => Err(D::Error::custom("revalidate: true is not valid")),
        }
    }
}

/// A cached computation result with its invalidation bookkeeping.
///
/// `value` holds the JSON text of the computed result, keeping the entry
/// opaque to the store and safe for the non-self-describing envelope format.
/// `tags` is a deduplicated set that only grows via merge until the whole
/// entry is overwritten by a fresh computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub kind: String,
    pub value: String,
    pub tags: BTreeSet<String>,
    pub stored_at: u64,
    pub revalidate: RevalidatePolicy,
}

impl CacheEntry {
    /// Create a new entry stamped with the current clock.
    pub fn new(
        value: String,
        tags: BTreeSet<String>,
        revalidate: RevalidatePolicy,
    ) -> Self {
        CacheEntry {
            kind: FETCH_KIND.to_string(),
            value,
            tags,
            stored_at: unix_now(),
            revalidate,
        }
    }

    /// Whether the entry carries the kind this layer writes.
    pub fn has_valid_kind(&self) -> bool {
        self.kind == FETCH_KIND
    }

    /// Whether the entry is stale at the given unix timestamp.
    pub fn is_stale(&self, now: u64) -> bool {
        match self.revalidate.window_secs() {
            Some(secs) => now >= self.stored_at.saturating_add(u64::from(secs)),
            None => false,
        }
    }

    /// Whether the entry is still fresh at the given unix timestamp.
    pub fn is_fresh(&self, now: u64) -> bool {
        !self.is_stale(now)
    }
}

/// Current unix timestamp in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_with(stored_at: u64, revalidate: RevalidatePolicy) -> CacheEntry {
        CacheEntry {
            kind: FETCH_KIND.to_string(),
            value: "\"v\"".to_string(),
            tags: BTreeSet::new(),
            stored_at,
            revalidate,
        }
    }

    #[test]
    fn test_fresh_within_window() {
        let entry = entry_with(1_000, RevalidatePolicy::After(60));
        assert!(entry.is_fresh(1_030));
        assert!(!entry.is_stale(1_030));
    }

    #[test]
    fn test_stale_at_window_boundary() {
        let entry = entry_with(1_000, RevalidatePolicy::After(60));
        assert!(entry.is_stale(1_060));
        assert!(entry.is_stale(1_000_000));
    }

    #[test]
    fn test_never_policy_is_terminal() {
        let entry = entry_with(0, RevalidatePolicy::Never);
        // Stored at the epoch, still never stale.
        assert!(entry.is_fresh(u64::MAX));
    }

    #[test]
    fn test_zero_window_rejected() {
        assert!(RevalidatePolicy::After(0).validate().is_err());
        assert!(RevalidatePolicy::After(1).validate().is_ok());
        assert!(RevalidatePolicy::Never.validate().is_ok());
    }

    #[test]
    fn test_default_policy() {
        assert_eq!(
            RevalidatePolicy::default(),
            RevalidatePolicy::After(DEFAULT_REVALIDATE_SECS)
        );
    }

    #[test]
    fn test_wire_codec() {
        #[derive(Serialize, Deserialize)]
        struct Probe {
            #[serde(with = "super::wire")]
            revalidate: RevalidatePolicy,
        }

        let json = serde_json::to_string(&Probe {
            revalidate: RevalidatePolicy::After(60),
        })
        .unwrap();
        assert_eq!(json, r#"{"revalidate":60}"#);

        let json = serde_json::to_string(&Probe {
            revalidate: RevalidatePolicy::Never,
        })
        .unwrap();
        assert_eq!(json, r#"{"revalidate":false}"#);

        let back: Probe = serde_json::from_str(r#"{"revalidate":120}"#).unwrap();
        assert_eq!(back.revalidate, RevalidatePolicy::After(120));

        let back: Probe = serde_json::from_str(r#"{"revalidate":false}"#).unwrap();
        assert_eq!(back.revalidate, RevalidatePolicy::Never);

        assert!(serde_json::from_str::<Probe>(r#"{"revalidate":true}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"revalidate":0}"#).is_err());
    }
}
