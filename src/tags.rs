//! Invalidation tag bookkeeping.
//!
//! Tags are deduplicated labels attached to cache entries so entries can be
//! invalidated in bulk by label rather than by key. Merging is a pure set
//! union with change detection; the `changed` flag is what gates the
//! write-back of a fresh-but-tag-incomplete entry.

use crate::args::Args;
use crate::error::Result;
use std::collections::BTreeSet;

/// Merge `incoming` tags into `existing`.
///
/// Pure, deterministic, and order-independent. Returns the merged set and
/// whether it differs from `existing`; merging a subset reports no change.
pub fn merge(existing: &BTreeSet<String>, incoming: &BTreeSet<String>) -> (BTreeSet<String>, bool) {
    let changed = !incoming.is_subset(existing);
    if !changed {
        return (existing.clone(), false);
    }
    let merged = existing.union(incoming).cloned().collect();
    (merged, true)
}

/// Derive the implicit tag set for a call: the function identity followed by
/// each rendered argument.
pub fn default_tags(unique_fn_id: &str, args: &Args) -> Result<Vec<String>> {
    let mut tags = Vec::with_capacity(args.len() + 1);
    tags.push(unique_fn_id.to_string());
    for arg in args {
        tags.push(arg.render()?);
    }
    Ok(tags)
}
