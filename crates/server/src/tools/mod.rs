//! MCP tool implementations.
//!
//! Worker tools deliver one event each to the worker's event table; cache
//! tools inspect the named caches directly.

pub mod cache;
pub mod worker;

use crate::error::ToolError;
use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

/// Encode a tool output as pretty JSON text content.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output)
        .map_err(|e| ToolError::EncodeFailed(format!("Failed to serialize output: {e}")))?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// Body as text when it is valid UTF-8.
pub(crate) fn text_body(body: &[u8]) -> Option<String> {
    std::str::from_utf8(body).ok().map(str::to_string)
}

#[cfg(test)]
pub(crate) mod testing {
    use rmcp::model::CallToolResult;
    use serde::de::DeserializeOwned;
    use std::sync::Arc;
    use stowaway_client::{ClientRegistry, FetchClient, FetchConfig, Worker};
    use stowaway_core::{AppConfig, CacheDb, RequestIdentity, StoredResponse};

    /// Nothing listens on the discard port, so every fetch is rejected.
    pub const ORIGIN: &str = "http://127.0.0.1:9";

    pub fn config() -> AppConfig {
        AppConfig { origin: ORIGIN.into(), timeout_ms: 2000, ..Default::default() }
    }

    async fn build(config: AppConfig, caches: CacheDb) -> Arc<Worker> {
        let network = Arc::new(FetchClient::new(FetchConfig::from(&config)).unwrap());
        Arc::new(Worker::new(config, caches, network, ClientRegistry::new()).await.unwrap())
    }

    /// Worker that has never been installed and cannot reach its origin.
    pub async fn offline_worker() -> Arc<Worker> {
        build(config(), CacheDb::open_in_memory().await.unwrap()).await
    }

    /// Worker resuming an already activated version whose cache holds the
    /// precache set, with the origin unreachable.
    pub async fn seeded_worker() -> Arc<Worker> {
        let config = config();
        let caches = CacheDb::open_in_memory().await.unwrap();
        let cache = caches.open_cache(&config.cache_name()).await.unwrap();

        for url in config.precache_urls().unwrap() {
            let response = StoredResponse {
                url: url.to_string(),
                status: 200,
                headers: vec![("content-type".into(), "text/html".into())],
                body: format!("<h1>{}</h1>", url.path()).into_bytes(),
                stored_at: chrono::Utc::now().to_rfc3339(),
            };
            cache.put(&RequestIdentity::get(url.as_str()), &response).await.unwrap();
        }
        caches.set_registration(ORIGIN, &config.cache_name()).await.unwrap();

        build(config, caches).await
    }

    /// Decode the JSON text content of a tool result.
    pub fn output<T: DeserializeOwned>(result: &CallToolResult) -> T {
        let content_val = serde_json::to_value(&result.content[0]).unwrap();
        let text = content_val
            .get("text")
            .and_then(|v| v.as_str())
            .expect("Expected text field in content");
        serde_json::from_str(text).unwrap()
    }
}
