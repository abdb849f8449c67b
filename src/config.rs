//! Base-URL resolution for the revalidation endpoint.
//!
//! The externally reachable base URL differs between environments: production
//! sets `SITE_URL` to the canonical hostname, preview deployments expose a
//! per-deployment hostname via `DEPLOYMENT_URL`, and local development falls
//! back to localhost.

/// Canonical production hostname, e.g. `example.com` (no scheme).
pub const SITE_URL_ENV: &str = "SITE_URL";

/// Per-deployment hostname in preview environments (no scheme).
pub const DEPLOYMENT_URL_ENV: &str = "DEPLOYMENT_URL";

const DEV_BASE_URL: &str = "http://localhost:3004";

/// Resolve the base URL of the running service from the environment.
pub fn resolve_base_url() -> String {
    resolve_base_url_with(|key| std::env::var(key).ok())
}

/// Resolution core with an injectable variable lookup.
pub fn resolve_base_url_with<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(host) = lookup(SITE_URL_ENV).filter(|h| !h.is_empty()) {
        return format!("https://{}", host);
    }
    if let Some(host) = lookup(DEPLOYMENT_URL_ENV).filter(|h| !h.is_empty()) {
        return format!("https://{}", host);
    }
    DEV_BASE_URL.to_string()
}
