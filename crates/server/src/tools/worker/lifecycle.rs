//! worker_install, worker_activate and client_close tool implementations.

use crate::error::ToolError;
use crate::tools::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use stowaway_client::{Event, EventOutcome, Worker, WorkerState};

/// Parameters for the client_close tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ClientCloseParams {
    /// Id of the page context that closed.
    pub client_id: String,
}

/// Output from the lifecycle tools.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct LifecycleOutput {
    pub cache_name: String,
    /// Lifecycle state after the call.
    pub state: String,
}

async fn lifecycle_output(worker: &Worker, state: Option<WorkerState>) -> Result<CallToolResult, McpError> {
    let state = match state {
        Some(state) => state,
        None => worker.state().await,
    };
    json_result(&LifecycleOutput { cache_name: worker.cache_name().to_string(), state: state.to_string() })
}

/// Install this version: precache, then activate or wait.
pub async fn install_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    match worker.dispatch(Event::Install).await? {
        EventOutcome::State(state) => lifecycle_output(worker, Some(state)).await,
        _ => lifecycle_output(worker, None).await,
    }
}

/// Activate an installed version.
pub async fn activate_impl(worker: &Worker) -> Result<CallToolResult, McpError> {
    match worker.dispatch(Event::Activate).await? {
        EventOutcome::State(state) => lifecycle_output(worker, Some(state)).await,
        _ => lifecycle_output(worker, None).await,
    }
}

/// Report a closed page context.
pub async fn client_close_impl(worker: &Worker, params: ClientCloseParams) -> Result<CallToolResult, McpError> {
    let client_id = params.client_id.trim();
    if client_id.is_empty() {
        return Err(ToolError::InvalidInput("client_id must not be empty".into()).into());
    }

    let state = worker.client_closed(client_id).await?;
    lifecycle_output(worker, Some(state)).await
}
