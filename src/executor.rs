//! Out-of-band revalidation executor.
//!
//! The executor is the receiving end of the revalidation protocol: it
//! re-invokes the original computation by identity and writes the fresh
//! result back under the same cache key. Nobody is waiting on the dispatching
//! side, so failures here are the endpoint's to log; no retry is performed.

use crate::backend::CacheStore;
use crate::dispatch::RevalidationRequest;
use crate::entry::CacheEntry;
use crate::error::{Error, Result};
use crate::registry::FunctionRegistry;
use crate::serialization::encode_for_store;
use serde_json::Value;
use std::sync::Arc;

/// Executor for revalidation requests.
///
/// Shares the same [`FunctionRegistry`] as the serving side, so a function
/// identity resolves to the same computation wherever the request lands.
#[derive(Clone)]
pub struct RevalidationExecutor<B: CacheStore> {
    store: B,
    registry: Arc<FunctionRegistry>,
}

impl<B: CacheStore> RevalidationExecutor<B> {
    pub fn new(store: B, registry: Arc<FunctionRegistry>) -> Self {
        RevalidationExecutor { store, registry }
    }

    /// Re-invoke the computation and overwrite the cache entry.
    ///
    /// On success the entry under `request.cache_key` carries the fresh
    /// value, the request's tags, and the request's revalidation policy.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownFunction`: the identity is not registered here
    /// - `Error::ComputeFailure`: the computation failed
    /// - `Error::BackendError`: the store write failed
    pub async fn handle(&self, request: RevalidationRequest) -> Result<Value> {
        let RevalidationRequest {
            unique_fn_id,
            args,
            cache_key,
            tags,
            revalidate,
        } = request;

        debug!("performing async revalidation for {}", unique_fn_id);

        let function = self.registry.get(&unique_fn_id)?;
        let value = function.call(args).await?;

        let body =
            serde_json::to_string(&value).map_err(|e| Error::SerializationError(e.to_string()))?;
        let entry = CacheEntry::new(body, tags.into_iter().collect(), revalidate);
        let bytes = encode_for_store(&entry)?;
        self.store.set(&cache_key, bytes, None, true).await?;

        debug!(
            "finished setting cache for {} on key {}",
            unique_fn_id, cache_key
        );
        Ok(value)
    }
}
