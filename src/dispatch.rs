//! Revalidation dispatch: wire message and transports.
//!
//! A stale hit hands one [`RevalidationRequest`] to a dispatcher, which sends
//! it to the out-of-band executor endpoint and returns as soon as the send
//! attempt resolves. The caller's request never waits for the recomputation,
//! only the hosting request's teardown waits for the dispatch task itself.

use crate::args::Args;
use crate::entry::RevalidatePolicy;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::future::Future;

#[cfg(feature = "http")]
use crate::error::Error;

/// Path of the revalidation endpoint, relative to the service base URL.
pub const REVALIDATE_ENDPOINT_PATH: &str = "/api/async-revalidate";

/// Wire message describing one revalidation: everything the executor needs to
/// re-invoke the computation and write the result back under the same key.
///
/// Created at the moment a stale hit is detected, consumed exactly once by
/// the executor, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidationRequest {
    pub unique_fn_id: String,
    pub args: Args,
    pub cache_key: String,
    pub tags: Vec<String>,
    #[serde(with = "crate::entry::wire")]
    pub revalidate: RevalidatePolicy,
}

/// Transport for revalidation requests.
///
/// Best-effort and one-way: `dispatch` resolves when the request has been
/// handed to the executor's endpoint, not when the recomputation finishes.
pub trait RevalidationDispatch: Send + Sync + Clone {
    /// Send one revalidation request to the out-of-band executor.
    ///
    /// # Errors
    /// Returns `Err` if the request could not be sent or was not accepted.
    /// The read path logs these failures and never surfaces them.
    fn dispatch(
        &self,
        request: RevalidationRequest,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// Dispatcher that drops requests on the floor.
///
/// For hosts that run without an out-of-band executor (development mode,
/// single-process tools); stale entries are then refreshed only by misses.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopDispatcher;

impl RevalidationDispatch for NoopDispatcher {
    async fn dispatch(&self, request: RevalidationRequest) -> Result<()> {
        debug!(
            "dropping revalidation for {} on {} (noop dispatcher)",
            request.unique_fn_id, request.cache_key
        );
        Ok(())
    }
}

/// HTTP dispatcher posting the wire message to the executor endpoint.
#[cfg(feature = "http")]
#[derive(Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    endpoint: String,
}

#[cfg(feature = "http")]
impl HttpDispatcher {
    /// Create a dispatcher targeting `{base_url}/api/async-revalidate`.
    pub fn new(base_url: &str) -> Self {
        HttpDispatcher {
            client: reqwest::Client::new(),
            endpoint: format!(
                "{}{}",
                base_url.trim_end_matches('/'),
                REVALIDATE_ENDPOINT_PATH
            ),
        }
    }

    /// Create a dispatcher using the environment-resolved base URL.
    pub fn from_env() -> Self {
        Self::new(&crate::config::resolve_base_url())
    }

    /// The absolute endpoint URL this dispatcher posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(feature = "http")]
impl RevalidationDispatch for HttpDispatcher {
    async fn dispatch(&self, request: RevalidationRequest) -> Result<()> {
        debug!(
            "requesting async revalidation for {} on {}",
            request.unique_fn_id, request.cache_key
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::DispatchFailure(format!(
                "revalidation endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::ArgValue;
    use serde_json::json;

    fn sample_request() -> RevalidationRequest {
        RevalidationRequest {
            unique_fn_id: "/page:fetchPage".to_string(),
            args: vec![ArgValue::from("slug"), ArgValue::from(2i64)],
            cache_key: "abc123".to_string(),
            tags: vec!["/page:fetchPage".to_string(), "slug".to_string()],
            revalidate: RevalidatePolicy::After(60),
        }
    }

    #[test]
    fn test_wire_field_names() {
        let wire = serde_json::to_value(sample_request()).unwrap();
        assert_eq!(
            wire,
            json!({
                "uniqueFnId": "/page:fetchPage",
                "args": ["slug", 2],
                "cacheKey": "abc123",
                "tags": ["/page:fetchPage", "slug"],
                "revalidate": 60,
            })
        );
    }

    #[test]
    fn test_wire_roundtrip_with_never_policy() {
        let mut request = sample_request();
        request.revalidate = RevalidatePolicy::Never;

        let wire = serde_json::to_string(&request).unwrap();
        assert!(wire.contains(r#""revalidate":false"#));

        let back: RevalidationRequest = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, request);
    }

    #[test]
    fn test_wire_rejects_invalid_revalidate() {
        let body = r#"{"uniqueFnId":"f","args":[],"cacheKey":"k","tags":[],"revalidate":true}"#;
        assert!(serde_json::from_str::<RevalidationRequest>(body).is_err());

        let body = r#"{"uniqueFnId":"f","args":[],"cacheKey":"k","tags":[],"revalidate":0}"#;
        assert!(serde_json::from_str::<RevalidationRequest>(body).is_err());
    }

    #[tokio::test]
    async fn test_noop_dispatcher_accepts() {
        let dispatcher = NoopDispatcher;
        dispatcher
            .dispatch(sample_request())
            .await
            .expect("noop dispatch failed");
    }

    #[cfg(feature = "http")]
    #[test]
    fn test_http_dispatcher_endpoint() {
        let dispatcher = HttpDispatcher::new("https://example.com/");
        assert_eq!(
            dispatcher.endpoint(),
            "https://example.com/api/async-revalidate"
        );
    }
}
