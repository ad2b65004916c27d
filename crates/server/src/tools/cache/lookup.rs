//! cache_match tool implementation.
//!
//! Looks up a stored response by request, in one named cache or across all
//! of them.

use crate::tools::{json_result, text_body};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_client::{Request, Worker};
use stowaway_core::Error;

/// Parameters for the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchParams {
    /// Absolute URL, or a path on the worker's origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Named cache to search. Searches every cache, oldest first, when omitted.
    #[serde(default)]
    pub cache: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output from the cache_match tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheMatchOutput {
    /// Cache the entry was found in.
    pub cache: String,
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    /// Body text; omitted for binary bodies.
    pub body: Option<String>,
    pub body_len: usize,
    pub stored_at: String,
}

pub async fn match_impl(worker: &Worker, params: CacheMatchParams) -> Result<CallToolResult, McpError> {
    let request = Request::parse(&params.method, &params.url, Some(worker.origin()))?;
    let identity = request.identity();

    let found = match params.cache {
        Some(name) => worker
            .caches()
            .cache(&name)
            .match_request(&identity)
            .await?
            .map(|response| (name, response)),
        None => worker.caches().match_any(&identity).await?,
    };

    let (cache, response) = found.ok_or_else(|| Error::CacheMiss(identity.to_string()))?;

    json_result(&CacheMatchOutput {
        cache,
        body: text_body(&response.body),
        body_len: response.body.len(),
        url: response.url,
        status: response.status,
        headers: response.headers,
        stored_at: response.stored_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, seeded_worker};

    fn params(url: &str) -> CacheMatchParams {
        CacheMatchParams { url: url.into(), method: default_method(), cache: None }
    }

    #[tokio::test]
    async fn test_match_precached_page() {
        let worker = seeded_worker().await;

        let result = match_impl(&worker, params("/offline.html")).await.unwrap();
        let out: CacheMatchOutput = output(&result);

        assert_eq!(out.cache, "sherlock-ramos-v1.0.0");
        assert_eq!(out.status, 200);
        assert_eq!(out.body.as_deref(), Some("<h1>/offline.html</h1>"));
        assert_eq!(out.body_len, 22);
    }

    #[tokio::test]
    async fn test_match_ignores_fragment() {
        let worker = seeded_worker().await;
        assert!(match_impl(&worker, params("/about/#team")).await.is_ok());
    }

    #[tokio::test]
    async fn test_match_miss() {
        let worker = seeded_worker().await;

        assert!(match_impl(&worker, params("/posts/unseen/")).await.is_err());

        let post = CacheMatchParams { method: "POST".into(), ..params("/") };
        assert!(match_impl(&worker, post).await.is_err());

        let other = CacheMatchParams { cache: Some("sherlock-ramos-v0.9.0".into()), ..params("/") };
        assert!(match_impl(&worker, other).await.is_err());
    }
}
