//! worker_message tool implementation.

use crate::tools::json_result;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use stowaway_client::{Event, EventOutcome, Worker};

/// Parameters for the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageParams {
    /// Posted message, e.g. `{"type": "SKIP_WAITING"}`.
    pub data: Value,
}

/// Output from the worker_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerMessageOutput {
    /// Whether the message was a recognized command.
    pub handled: bool,
    pub state: String,
}

pub async fn message_impl(worker: &Worker, params: WorkerMessageParams) -> Result<CallToolResult, McpError> {
    let (handled, state) = match worker.dispatch(Event::Message(params.data)).await? {
        EventOutcome::State(state) => (true, state),
        _ => (false, worker.state().await),
    };

    json_result(&WorkerMessageOutput { handled, state: state.to_string() })
}
