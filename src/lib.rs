//! # swr-kit
//!
//! A stale-while-revalidate caching layer for expensive, deterministic
//! computations keyed by function identity and arguments.
//!
//! ## Features
//!
//! - **Per-Request Memoization:** Identical calls within one logical request
//!   execute once, without touching the external store
//! - **Stale-While-Revalidate:** Stale entries are served immediately; the
//!   refresh runs out of band and its failures never reach the caller
//! - **Decoupled Revalidation:** Refreshes travel as wire messages to an
//!   executor endpoint, so the recomputation can run anywhere the function
//!   registry is available
//! - **Tag-Based Invalidation:** Entries carry deduplicated invalidation
//!   tags that accumulate on the ambient request
//! - **Store Agnostic:** The cache store is an injected trait; an in-memory
//!   reference implementation ships for tests and single-process hosts
//!
//! ## Quick Start
//!
//! ```ignore
//! use swr_kit::{
//!     ArgValue, CacheOptions, FunctionRegistry, HttpDispatcher, InMemoryStore,
//!     ReadThroughCache, RequestContext,
//! };
//! use std::sync::Arc;
//!
//! // 1. Register computations under stable identities
//! let mut registry = FunctionRegistry::new();
//! registry.register("/page:fetchPage", |args| async move {
//!     // fetch from the origin...
//!     Ok(serde_json::json!({ "data": "hello" }))
//! });
//! let registry = Arc::new(registry);
//!
//! // 2. Wire the cache with an injected store and dispatcher
//! let cache = ReadThroughCache::new(
//!     InMemoryStore::new(),
//!     registry.clone(),
//!     HttpDispatcher::from_env(),
//! );
//!
//! // 3. One context per inbound request
//! let ctx = RequestContext::new();
//! let page = cache
//!     .get_or_compute(
//!         &ctx,
//!         "/page:fetchPage",
//!         CacheOptions::default(),
//!         vec![ArgValue::from("home")],
//!     )
//!     .await?;
//!
//! // 4. After the response value is produced, let the request await its
//! //    background dispatches
//! ctx.drain_background().await;
//! ```
//!
//! The executor side mounts the revalidation endpoint over the same registry:
//!
//! ```ignore
//! let executor = RevalidationExecutor::new(store, registry);
//! let app = swr_kit::endpoint::router(executor);
//! ```

#[macro_use]
extern crate log;

pub mod args;
pub mod backend;
pub mod config;
pub mod context;
pub mod dispatch;
#[cfg(feature = "http")]
pub mod endpoint;
pub mod entry;
pub mod error;
pub mod executor;
pub mod key;
pub mod observability;
pub mod registry;
pub mod serialization;
pub mod swr;
pub mod tags;

// Re-exports for convenience
pub use args::{args_from_json, ArgValue, Args, ScalarValue};
pub use backend::{CacheStore, InMemoryStore};
pub use context::{run_scoped, RequestContext};
#[cfg(feature = "http")]
pub use dispatch::HttpDispatcher;
pub use dispatch::{NoopDispatcher, RevalidationDispatch, RevalidationRequest};
pub use entry::{CacheEntry, RevalidatePolicy, DEFAULT_REVALIDATE_SECS};
pub use error::{Error, Result};
pub use executor::RevalidationExecutor;
pub use observability::{CacheMetrics, NoOpMetrics};
pub use registry::{CachedFunction, FunctionRegistry};
pub use swr::{CacheOptions, ReadThroughCache};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
