//! Read-through cache with stale-while-revalidate semantics.
//!
//! [`ReadThroughCache`] is the entry point: it derives the cache key, dedups
//! the call through the request scope, consults the injected store, and
//! branches on the derived entry status. Misses and malformed entries make
//! the caller wait for a synchronous recomputation; stale entries return the
//! cached value immediately and hand a [`RevalidationRequest`] to the
//! dispatcher as a detached background task of the hosting request.

use crate::args::Args;
use crate::backend::CacheStore;
use crate::context::RequestContext;
use crate::dispatch::{RevalidationDispatch, RevalidationRequest};
use crate::entry::{unix_now, CacheEntry, RevalidatePolicy};
use crate::error::{Error, Result};
use crate::key;
use crate::observability::{CacheMetrics, NoOpMetrics};
use crate::registry::FunctionRegistry;
use crate::serialization::{decode_from_store, encode_for_store};
use crate::tags;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

/// Per-call options: revalidation policy and invalidation tags.
#[derive(Clone, Debug, Default)]
pub struct CacheOptions {
    /// Staleness window of the entry this call stores or refreshes.
    pub revalidate: RevalidatePolicy,
    /// Invalidation tags attached to the entry and accumulated on the
    /// ambient request.
    pub tags: Vec<String>,
}

impl CacheOptions {
    pub fn new(revalidate: RevalidatePolicy) -> Self {
        CacheOptions {
            revalidate,
            tags: Vec::new(),
        }
    }

    /// Options for an entry that is never revalidated once stored.
    pub fn no_revalidate() -> Self {
        Self::new(RevalidatePolicy::Never)
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Options carrying the implicit tag set for a call: the function
    /// identity plus each rendered argument.
    pub fn for_call(
        unique_fn_id: &str,
        args: &Args,
        revalidate: RevalidatePolicy,
    ) -> Result<Self> {
        Ok(Self::new(revalidate).with_tags(tags::default_tags(unique_fn_id, args)?))
    }
}

/// Read-through cache orchestrator.
///
/// Construction wires the three collaborators explicitly: the external store,
/// the registry of computations, and the dispatcher for background
/// revalidations. The instance is cheap to clone and share.
///
/// # Example
///
/// ```ignore
/// use swr_kit::{FunctionRegistry, InMemoryStore, NoopDispatcher, ReadThroughCache};
/// use std::sync::Arc;
///
/// let mut registry = FunctionRegistry::new();
/// registry.register("/page:fetchPage", fetch_page);
///
/// let cache = ReadThroughCache::new(
///     InMemoryStore::new(),
///     Arc::new(registry),
///     NoopDispatcher,
/// );
/// ```
#[derive(Clone)]
pub struct ReadThroughCache<B: CacheStore, D: RevalidationDispatch> {
    store: B,
    registry: Arc<FunctionRegistry>,
    dispatcher: D,
    metrics: Arc<dyn CacheMetrics>,
}

impl<B, D> ReadThroughCache<B, D>
where
    B: CacheStore + 'static,
    D: RevalidationDispatch + 'static,
{
    /// Create a new read-through cache over the given collaborators.
    pub fn new(store: B, registry: Arc<FunctionRegistry>, dispatcher: D) -> Self {
        ReadThroughCache {
            store,
            registry,
            dispatcher,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: Arc<dyn CacheMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Get store reference (for advanced use).
    pub fn store(&self) -> &B {
        &self.store
    }

    /// Look up or compute the value for a function identity and arguments.
    ///
    /// Within one request context, identical calls resolve through a single
    /// shared computation. Externally observed latency is bounded by the
    /// computation only on a true miss; a stale hit pays only the store read
    /// and returns the previous value while a refresh is dispatched out of
    /// band.
    ///
    /// # Errors
    ///
    /// Returns `Err` in these cases:
    /// - `Error::ConfigError`: a zero revalidation window was requested
    /// - `Error::BackendError`: the store could not be reached
    /// - `Error::ComputeFailure`: the computation failed on the miss path
    /// - `Error::UnknownFunction`: the identity is not registered
    /// - `Error::SerializationError`: the computed value could not be encoded
    ///
    /// Dispatch failures after a stale value has been returned are logged,
    /// never surfaced.
    pub async fn get_or_compute(
        &self,
        ctx: &RequestContext,
        unique_fn_id: &str,
        options: CacheOptions,
        args: Args,
    ) -> Result<Value> {
        options.revalidate.validate()?;

        let raw_key = key::build_raw_key(unique_fn_id, &args)?;
        let cache_key = self.store.fetch_cache_key(&raw_key);

        debug!(
            "» cache operation for {} on key {}",
            unique_fn_id, cache_key
        );

        let this = self.clone();
        let scope = ctx.clone();
        let fn_id = unique_fn_id.to_string();
        let memo_key = cache_key.clone();
        let body = ctx
            .memoize(&cache_key, async move {
                this.lookup_or_compute(scope, fn_id, memo_key, options, args)
                    .await
            })
            .await?;

        serde_json::from_str(&body).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    /// Typed convenience over [`ReadThroughCache::get_or_compute`].
    pub async fn get_or_compute_as<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        unique_fn_id: &str,
        options: CacheOptions,
        args: Args,
    ) -> Result<T> {
        let value = self.get_or_compute(ctx, unique_fn_id, options, args).await?;
        serde_json::from_value(value).map_err(|e| Error::DeserializationError(e.to_string()))
    }

    /// The single-flight body behind the request-scope memoization.
    ///
    /// Returns the JSON text of the value, which is what the scope shares
    /// between duplicate callers.
    async fn lookup_or_compute(
        self,
        ctx: RequestContext,
        fn_id: String,
        cache_key: String,
        options: CacheOptions,
        args: Args,
    ) -> Result<String> {
        let timer = Instant::now();

        // The call's tags always land on the ambient request, whichever
        // branch is taken below.
        ctx.add_tags(options.tags.iter().cloned());

        if ctx.is_cache_disabled() {
            debug!("global cache disabled, invoking {} directly", fn_id);
            let value = self.invoke(&fn_id, args).await?;
            return serde_json::to_string(&value)
                .map_err(|e| Error::SerializationError(e.to_string()));
        }

        // An explicit revalidation is already in progress for this request;
        // reading the entry back here would recurse forever.
        let stored = if ctx.is_on_demand_revalidate() {
            debug!("on-demand revalidation, skipping lookup for {}", cache_key);
            None
        } else {
            self.store.get(&cache_key).await?
        };

        let entry = match stored {
            Some(bytes) => match decode_from_store::<CacheEntry>(&bytes) {
                Ok(entry) if entry.has_valid_kind() => Some(entry),
                Ok(entry) => {
                    warn!(
                        "making caller wait for {}: invalid entry kind {} at {}",
                        fn_id, entry.kind, cache_key
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        "making caller wait for {}: malformed entry at {}: {}",
                        fn_id, cache_key, e
                    );
                    None
                }
            },
            None => {
                if !ctx.is_on_demand_revalidate() {
                    warn!(
                        "making caller wait for {}: no cache entry at {}",
                        fn_id, cache_key
                    );
                }
                None
            }
        };

        let Some(entry) = entry else {
            let body = self
                .compute_and_store(&fn_id, &cache_key, &options, args)
                .await?;
            self.metrics.record_miss(&cache_key, timer.elapsed());
            return Ok(body);
        };

        if entry.is_stale(unix_now()) {
            // Serve the stale value now; the refresh happens out of band and
            // its failure never reaches this caller.
            self.spawn_revalidation(&ctx, &fn_id, &cache_key, &entry, &options, args);
            self.metrics.record_stale_hit(&cache_key, timer.elapsed());
            return Ok(entry.value);
        }

        // Fresh hit: fold the entry's tags into the ambient request, and grow
        // the entry if this call carries tags it has not seen yet.
        ctx.add_tags(entry.tags.iter().cloned());

        let incoming: BTreeSet<String> = options.tags.iter().cloned().collect();
        let (merged, changed) = tags::merge(&entry.tags, &incoming);
        if changed {
            let mut updated = entry.clone();
            updated.tags = merged;
            let bytes = encode_for_store(&updated)?;
            self.store.set(&cache_key, bytes, None, true).await?;
            debug!("grew tag set on fresh entry {}", cache_key);
        }

        self.metrics.record_hit(&cache_key, timer.elapsed());
        Ok(entry.value)
    }

    /// Invoke the computation synchronously and overwrite the entry.
    async fn compute_and_store(
        &self,
        fn_id: &str,
        cache_key: &str,
        options: &CacheOptions,
        args: Args,
    ) -> Result<String> {
        let value = self.invoke(fn_id, args).await?;
        let body =
            serde_json::to_string(&value).map_err(|e| Error::SerializationError(e.to_string()))?;

        let entry = CacheEntry::new(
            body.clone(),
            options.tags.iter().cloned().collect(),
            options.revalidate,
        );
        let bytes = encode_for_store(&entry)?;
        self.store.set(cache_key, bytes, None, true).await?;

        Ok(body)
    }

    async fn invoke(&self, fn_id: &str, args: Args) -> Result<Value> {
        let function = self.registry.get(fn_id)?;
        function.call(args).await
    }

    /// Hand off a revalidation request as a background task of the request.
    ///
    /// The task is registered on the context so the hosting runtime awaits it
    /// at teardown; the value already returned to the caller does not.
    fn spawn_revalidation(
        &self,
        ctx: &RequestContext,
        fn_id: &str,
        cache_key: &str,
        entry: &CacheEntry,
        options: &CacheOptions,
        args: Args,
    ) {
        let incoming: BTreeSet<String> = options.tags.iter().cloned().collect();
        let (tag_set, _) = tags::merge(&entry.tags, &incoming);

        let request = RevalidationRequest {
            unique_fn_id: fn_id.to_string(),
            args,
            cache_key: cache_key.to_string(),
            tags: tag_set.into_iter().collect(),
            revalidate: options.revalidate,
        };

        self.metrics.record_dispatch(cache_key);

        let dispatcher = self.dispatcher.clone();
        let metrics = self.metrics.clone();
        let id = fn_id.to_string();
        let key = cache_key.to_string();
        let handle = tokio::spawn(async move {
            match dispatcher.dispatch(request).await {
                Ok(()) => debug!("finished requesting revalidation for {} on {}", id, key),
                Err(e) => {
                    metrics.record_error(&key, &e.to_string());
                    error!("failed requesting revalidation for {} on {}: {}", id, key, e);
                }
            }
        });
        ctx.register_background(handle);
    }
}
