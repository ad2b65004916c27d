//! worker_status tool implementation.

use crate::tools::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_client::Worker;
use stowaway_core::CacheInfo;

/// Output from the worker_status tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerStatusOutput {
    pub app_name: String,
    pub version: String,
    /// Cache name this version installs into.
    pub cache_name: String,
    /// Lifecycle state: parsed, installing, waiting, activating, active or redundant.
    pub state: String,
    /// Cache currently answering fetches for the origin.
    pub serving_cache: Option<String>,
    pub skip_waiting: bool,
    /// Open clients known to the worker.
    pub clients: usize,
    /// Every named cache in the store, oldest first.
    pub caches: Vec<CacheInfo>,
}

pub async fn status_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    let status = worker.status().await;
    let caches = worker.caches().cache_info().await?;

    json_result(&WorkerStatusOutput {
        app_name: status.app_name,
        version: status.version,
        cache_name: status.cache_name,
        state: status.state.to_string(),
        serving_cache: status.serving_cache,
        skip_waiting: status.skip_waiting,
        clients: status.clients,
        caches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{offline_worker, output, seeded_worker};

    #[tokio::test]
    async fn test_status_before_install() {
        let worker = offline_worker().await;

        let out: WorkerStatusOutput = output(&status_impl(&worker).await.unwrap());
        assert_eq!(out.state, "parsed");
        assert_eq!(out.version, "v1.0.0");
        assert_eq!(out.serving_cache, None);
        assert!(out.caches.is_empty());
    }

    #[tokio::test]
    async fn test_status_of_resumed_worker() {
        let worker = seeded_worker().await;

        let out: WorkerStatusOutput = output(&status_impl(&worker).await.unwrap());
        assert_eq!(out.state, "active");
        assert_eq!(out.serving_cache.as_deref(), Some("sherlock-ramos-v1.0.0"));
        assert_eq!(out.caches.len(), 1);
        assert_eq!(out.caches[0].entries, 4);
    }
}
