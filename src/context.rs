//! Per-request context: memoization scope, tag accumulator, and
//! background-task tracking.
//!
//! One [`RequestContext`] is created at the start of each logical inbound
//! request and torn down after it completes. It is a cheap-clone handle; all
//! clones share the same scope. Contexts are never shared across requests;
//! the memoization table is what guarantees that identical calls within one
//! request execute once, without involving the external store.

use crate::error::Result;
use crate::tags;
use futures::future::{BoxFuture, Shared};
use futures::FutureExt;
use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;

type MemoFuture = Shared<BoxFuture<'static, Result<String>>>;

struct ContextInner {
    memo: Mutex<HashMap<String, MemoFuture>>,
    tags: Mutex<BTreeSet<String>>,
    pending: Mutex<Vec<JoinHandle<()>>>,
    on_demand_revalidate: bool,
    cache_disabled: bool,
}

/// Per-request execution context.
///
/// Carries the three pieces of ambient request state explicitly instead of
/// relying on task-local storage: the memoization table, the accumulated
/// invalidation tags, and the detached background tasks the hosting request
/// must await before tearing down.
#[derive(Clone)]
pub struct RequestContext {
    inner: Arc<ContextInner>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RequestContext {
    /// Create a fresh context for a new inbound request.
    pub fn new() -> Self {
        RequestContext {
            inner: Arc::new(ContextInner {
                memo: Mutex::new(HashMap::new()),
                tags: Mutex::new(BTreeSet::new()),
                pending: Mutex::new(Vec::new()),
                on_demand_revalidate: false,
                cache_disabled: false,
            }),
        }
    }

    /// Mark this request as an on-demand revalidation.
    ///
    /// The read path then skips the store lookup and recomputes, which is
    /// what prevents an explicit revalidation from recursing into itself.
    ///
    /// Configure before handing clones out; flags are fixed once shared.
    pub fn with_on_demand_revalidate(mut self) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.on_demand_revalidate = true;
        }
        self
    }

    /// Disable the external store for this request (development mode).
    ///
    /// Only request-level memoization applies; no store traffic happens.
    pub fn without_global_cache(mut self) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.cache_disabled = true;
        }
        self
    }

    pub fn is_on_demand_revalidate(&self) -> bool {
        self.inner.on_demand_revalidate
    }

    pub fn is_cache_disabled(&self) -> bool {
        self.inner.cache_disabled
    }

    /// Memoize a computation under a cache key for the lifetime of this
    /// request.
    ///
    /// The first caller installs the future; concurrent and subsequent
    /// callers for the same key await the same shared result. The
    /// computation runs exactly once per scope regardless of how many
    /// callers ask for it.
    pub async fn memoize<F>(&self, key: &str, compute: F) -> Result<String>
    where
        F: Future<Output = Result<String>> + Send + 'static,
    {
        let shared = {
            let mut memo = self
                .inner
                .memo
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match memo.get(key) {
                Some(existing) => existing.clone(),
                None => {
                    let shared = compute.boxed().shared();
                    memo.insert(key.to_string(), shared.clone());
                    shared
                }
            }
        };
        shared.await
    }

    /// Merge tags into the request's accumulator.
    ///
    /// Returns whether the accumulator actually changed.
    pub fn add_tags<I>(&self, incoming: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let incoming: BTreeSet<String> = incoming.into_iter().collect();
        if incoming.is_empty() {
            return false;
        }
        let mut current = self
            .inner
            .tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (merged, changed) = tags::merge(&current, &incoming);
        if changed {
            *current = merged;
        }
        changed
    }

    /// Snapshot of the tags accumulated so far.
    pub fn tags(&self) -> BTreeSet<String> {
        self.inner
            .tags
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a detached background task with this request.
    ///
    /// The task is not awaited by any caller-visible value; it is awaited by
    /// [`RequestContext::drain_background`] at request teardown so the
    /// hosting runtime does not abandon it mid-flight.
    pub fn register_background(&self, handle: JoinHandle<()>) {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(handle);
    }

    /// Await every registered background task.
    ///
    /// Called by the hosting request's teardown logic, after the response
    /// value has already been produced. Tasks registered while draining are
    /// drained too.
    pub async fn drain_background(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut pending = self
                    .inner
                    .pending
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner);
                std::mem::take(&mut *pending)
            };
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!("background task did not complete cleanly: {}", e);
                }
            }
        }
    }
}

/// Run a request body in the given context, then drain its background tasks.
///
/// The return value is produced before any background work is awaited, so
/// callers never pay for dispatch latency; only the surrounding request
/// lifetime does.
pub async fn run_scoped<Fut, T>(ctx: &RequestContext, body: Fut) -> T
where
    Fut: Future<Output = T>,
{
    let out = body.await;
    ctx.drain_background().await;
    out
}
