//! HTTP surface of the revalidation executor.
//!
//! One route: `POST /api/async-revalidate`. The handler acknowledges the
//! request immediately and performs the recomputation and cache write in a
//! detached task, so the response never reflects the outcome of the
//! background work; failures are logged at this boundary.

use crate::backend::CacheStore;
use crate::dispatch::{RevalidationRequest, REVALIDATE_ENDPOINT_PATH};
use crate::executor::RevalidationExecutor;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

/// Build the revalidation endpoint router around an executor.
///
/// # Example
///
/// ```ignore
/// let executor = RevalidationExecutor::new(store, registry);
/// let app = swr_kit::endpoint::router(executor);
/// axum::serve(listener, app).await?;
/// ```
pub fn router<B>(executor: RevalidationExecutor<B>) -> Router
where
    B: CacheStore + 'static,
{
    Router::new()
        .route(REVALIDATE_ENDPOINT_PATH, post(accept::<B>))
        .with_state(executor)
}

/// Accept a revalidation request and return before the work completes.
async fn accept<B>(
    State(executor): State<RevalidationExecutor<B>>,
    Json(request): Json<RevalidationRequest>,
) -> Json<Value>
where
    B: CacheStore + 'static,
{
    let unique_fn_id = request.unique_fn_id.clone();
    let cache_key = request.cache_key.clone();
    let log_key = cache_key.clone();

    tokio::spawn(async move {
        if let Err(e) = executor.handle(request).await {
            error!(
                "async revalidation failed for {} on {}: {}",
                unique_fn_id, log_key, e
            );
        }
    });

    Json(json!({ "status": "accepted", "cacheKey": cache_key }))
}
