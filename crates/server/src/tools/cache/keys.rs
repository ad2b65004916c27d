//! cache_keys tool implementation.
//!
//! Lists the request identities stored in one named cache.

use crate::tools::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_client::Worker;
use stowaway_core::Error;

/// Parameters for the cache_keys tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysParams {
    /// Named cache to list. Defaults to the cache currently serving the origin.
    #[serde(default)]
    pub cache: Option<String>,
}

/// Output from the cache_keys tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheKeysOutput {
    pub cache: String,
    /// Entries as `METHOD url`, in insertion order.
    pub keys: Vec<String>,
}

pub async fn keys_impl(worker: &Worker, params: CacheKeysParams) -> Result<CallToolResult, McpError> {
    let name = match params.cache {
        Some(name) => name,
        None => worker
            .serving_cache()
            .await
            .unwrap_or_else(|| worker.cache_name().to_string()),
    };

    if !worker.caches().has_cache(&name).await? {
        return Err(Error::CacheMiss(format!("no cache named {name}")).into());
    }

    let keys = worker
        .caches()
        .cache(&name)
        .keys()
        .await?
        .iter()
        .map(ToString::to_string)
        .collect();

    json_result(&CacheKeysOutput { cache: name, keys })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{ORIGIN, offline_worker, output, seeded_worker};

    #[tokio::test]
    async fn test_keys_of_serving_cache() {
        let worker = seeded_worker().await;

        let result = keys_impl(&worker, CacheKeysParams::default()).await.unwrap();
        let out: CacheKeysOutput = output(&result);

        assert_eq!(out.cache, "sherlock-ramos-v1.0.0");
        assert_eq!(
            out.keys,
            vec![
                format!("GET {ORIGIN}/"),
                format!("GET {ORIGIN}/posts/"),
                format!("GET {ORIGIN}/about/"),
                format!("GET {ORIGIN}/offline.html"),
            ]
        );
    }

    #[tokio::test]
    async fn test_keys_of_missing_cache() {
        let worker = offline_worker().await;

        let result = keys_impl(&worker, CacheKeysParams::default()).await;
        assert!(result.is_err());

        let params = CacheKeysParams { cache: Some("sherlock-ramos-v0.9.0".into()) };
        assert!(keys_impl(&worker, params).await.is_err());
    }
}
