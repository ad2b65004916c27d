//! MCP server handler implementation.
//!
//! This module defines the main server handler that
//! routes tool calls to the worker.
use crate::tools::cache::{CacheKeysParams, CacheMatchParams, keys_impl, match_impl};
use crate::tools::worker::{
    ClientCloseParams, WorkerFetchParams, WorkerMessageParams, activate_impl, client_close_impl, fetch_impl,
    install_impl, message_impl, status_impl,
};

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};
use std::sync::Arc;
use stowaway_client::Worker;

/// The MCP server handler wrapping one worker version.
#[derive(Clone)]
pub struct StowawayServer {
    worker: Arc<Worker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
///
/// Maps tool names to handler methods.
#[tool_router]
impl StowawayServer {
    pub fn new(worker: Arc<Worker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(description = "Report the worker's version, lifecycle state, serving cache and every named cache.")]
    async fn worker_status(&self) -> Result<CallToolResult, McpError> {
        status_impl(&self.worker).await
    }

    /// Install the configured version.
    ///
    /// Pre-caches the critical pages with reload semantics; all-or-nothing.
    #[tool(
        description = "Install the configured version: pre-cache critical pages, then activate (or wait for older clients to close)."
    )]
    async fn worker_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Activate an installed version: delete every other named cache and claim all clients.")]
    async fn worker_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Deliver a fetch event.
    ///
    /// Documents go network-first with offline fallback, same-origin assets
    /// cache-first; anything else passes through to the network.
    #[tool(
        description = "Fetch a URL as a page of the site would. Returns the response with its source: network, cache, offline_fallback or pass_through."
    )]
    async fn worker_fetch(&self, params: Parameters<WorkerFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a message to the worker. {\"type\": \"SKIP_WAITING\"} activates a waiting version.")]
    async fn worker_message(&self, params: Parameters<WorkerMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report that a page context closed. A waiting version activates once no older clients remain.")]
    async fn client_close(&self, params: Parameters<ClientCloseParams>) -> Result<CallToolResult, McpError> {
        client_close_impl(&self.worker, params.0).await
    }

    #[tool(description = "List the requests stored in a named cache (default: the serving cache).")]
    async fn cache_keys(&self, params: Parameters<CacheKeysParams>) -> Result<CallToolResult, McpError> {
        keys_impl(&self.worker, params.0).await
    }

    #[tool(description = "Look up a stored response by URL and method, in one named cache or across all of them.")]
    async fn cache_match(&self, params: Parameters<CacheMatchParams>) -> Result<CallToolResult, McpError> {
        match_impl(&self.worker, params.0).await
    }
}

impl ServerHandler for StowawayServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "stowaway".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!(
                "Offline cache worker for {} (version {}).",
                self.worker.config().origin,
                self.worker.config().version
            )),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::offline_worker;

    #[tokio::test]
    async fn test_registers_every_tool() {
        let server = StowawayServer::new(offline_worker().await);

        let mut names: Vec<String> = server
            .tool_router
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();

        assert_eq!(
            names,
            vec![
                "cache_keys",
                "cache_match",
                "client_close",
                "worker_activate",
                "worker_fetch",
                "worker_install",
                "worker_message",
                "worker_status",
            ]
        );
    }

    #[tokio::test]
    async fn test_server_info() {
        let server = StowawayServer::new(offline_worker().await);
        let info = server.get_info();

        assert_eq!(info.server_info.name, "stowaway");
        assert!(info.instructions.unwrap().contains("http://127.0.0.1:9"));
    }
}
