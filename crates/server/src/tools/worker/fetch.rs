//! worker_fetch tool implementation.
//!
//! Delivers a fetch event for a page request. Requests the worker does not
//! intercept are fetched from the network as-is, with no cache effects.

use crate::tools::{json_result, text_body};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use stowaway_client::{Destination, Event, EventOutcome, Request, ResponseSource, Worker};
use stowaway_core::Error;

/// Input parameters for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchParams {
    /// Absolute URL, or a path on the worker's origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Request destination: "document" for navigations, "script", "style",
    /// "image", "font", or empty for programmatic fetches.
    #[serde(default)]
    pub destination: String,

    /// Page context issuing the request.
    #[serde(default)]
    pub client_id: Option<String>,

    /// Request body for non-GET requests.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the worker_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct WorkerFetchOutput {
    /// URL the response was produced for.
    pub url: String,
    /// "network", "cache", "offline_fallback" or "pass_through".
    pub source: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body text; omitted for binary bodies.
    pub body: Option<String>,
    pub body_len: usize,
    /// Cache controlling the issuing client after the event, if a client was given.
    pub controller: Option<String>,
    pub elapsed_ms: u64,
}

fn source_name(source: ResponseSource) -> &'static str {
    match source {
        ResponseSource::Network => "network",
        ResponseSource::Cache => "cache",
        ResponseSource::OfflineFallback => "offline_fallback",
    }
}

fn content_type(headers: &[(String, String)]) -> Option<String> {
    headers
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.clone())
}

pub async fn fetch_impl(worker: &Worker, params: WorkerFetchParams) -> Result<CallToolResult, McpError> {
    let started = Instant::now();

    let destination = params.destination.parse::<Destination>().unwrap_or_default();
    let mut request = Request::parse(&params.method, &params.url, Some(worker.origin()))?.with_destination(destination);
    if let Some(client_id) = &params.client_id {
        request = request.with_client(client_id.clone());
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }

    let (source, url, status, headers, body) = match worker.dispatch(Event::Fetch(request.clone())).await? {
        EventOutcome::Respond(served) => {
            (source_name(served.source()), served.url(), served.status(), served.headers(), served.body().to_vec())
        }
        EventOutcome::PassThrough => {
            let response = worker.pass_through(&request).await?;
            (
                "pass_through",
                response.final_url.to_string(),
                response.status.as_u16(),
                response.header_pairs(),
                response.bytes.to_vec(),
            )
        }
        other => return Err(Error::InvalidState(format!("fetch event produced {other:?}")).into()),
    };

    let controller = match &params.client_id {
        Some(client_id) => worker.clients().controller(client_id).await,
        None => None,
    };

    let output = WorkerFetchOutput {
        url,
        source: source.to_string(),
        status,
        content_type: content_type(&headers),
        headers,
        body: text_body(&body),
        body_len: body.len(),
        controller,
        elapsed_ms: started.elapsed().as_millis() as u64,
    };

    tracing::info!(
        url = %request.url,
        source = %output.source,
        status = output.status,
        elapsed_ms = output.elapsed_ms,
        "Fetch handled"
    );

    json_result(&output)
}
