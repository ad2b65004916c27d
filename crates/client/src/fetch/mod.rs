//! Network access for the worker.
//!
//! ### Network trait
//! Strategies never talk to reqwest directly; they go through [`Network`] so
//! a rejected fetch (offline, DNS failure, timeout) is always an
//! `Error::Network` regardless of the transport.
//!
//! ### Transparency
//! Any HTTP status is a successful fetch. Status, headers and body are
//! handed back unmodified; only the strategies decide what is cacheable.
//!
//! ### Limits
//! - Max redirects: 5
//! - Max cacheable body bytes: 5MB (configurable). Larger bodies are still
//!   returned, flagged `oversized`, and never stored.
//! - Request timeout: 20s (configurable)

pub mod request;
pub mod ssrf;
pub mod url;

use bytes::Bytes;
use reqwest::{Client, StatusCode, header};
use std::time::{Duration, Instant};
use stowaway_core::{AppConfig, Error, StoredResponse};

pub use self::request::{CacheMode, Destination, Request};
pub use self::ssrf::validate_public;
pub use self::url::{UrlError, canonicalize, same_origin};

/// Source of network responses.
#[async_trait::async_trait]
pub trait Network: Send + Sync {
    /// Perform `request` against the network.
    ///
    /// Resolves with any HTTP response; rejects only when no response arrives.
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error>;
}

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "stowaway/0.1")
    pub user_agent: String,

    /// Largest body stored in a cache, in bytes (default: 5MB)
    pub max_bytes: usize,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "stowaway/0.1".to_string(),
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_millis(20000),
            max_redirects: 5,
        }
    }
}

impl From<&AppConfig> for FetchConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            max_bytes: config.max_bytes,
            timeout: config.timeout(),
            ..Default::default()
        }
    }
}

/// Response from a fetch operation.
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// The URL requested
    pub url: ::url::Url,
    /// The final URL after redirects
    pub final_url: ::url::Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Response body bytes
    pub bytes: Bytes,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
    /// Body exceeds the configured `max_bytes`.
    pub oversized: bool,
}

impl FetchResponse {
    /// Only a plain 200 within the size limit is written by the strategies;
    /// partial, error and oversized responses are returned but never stored.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && !self.oversized
    }

    /// Header pairs in received order; non-UTF-8 values are replaced lossily.
    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), String::from_utf8_lossy(value.as_bytes()).into_owned()))
            .collect()
    }

    /// Snapshot this response for storage.
    pub fn to_stored(&self) -> StoredResponse {
        StoredResponse {
            url: self.final_url.to_string(),
            status: self.status.as_u16(),
            headers: self.header_pairs(),
            body: self.bytes.to_vec(),
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// HTTP fetch client backed by reqwest.
pub struct FetchClient {
    http: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Create a new fetch client with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    fn exceeds_limit(&self, len: usize) -> bool {
        len > self.config.max_bytes
    }
}

#[async_trait::async_trait]
impl Network for FetchClient {
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error> {
        let start = Instant::now();

        let mut builder = self
            .http
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Network(format!("timeout: {e}"))
            } else {
                Error::Network(format!("network error: {e}"))
            }
        })?;

        let status = response.status();
        let final_url = response.url().clone();
        let headers = response.headers().clone();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Network(format!("failed to read response: {e}")))?;

        let oversized = self.exceeds_limit(bytes.len());
        if oversized {
            tracing::debug!("{} bytes from {} exceeds max_bytes, not cacheable", bytes.len(), request.url);
        }

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} {} -> {} {} in {}ms ({} bytes)",
            request.method,
            request.url,
            status.as_u16(),
            final_url,
            fetch_ms,
            bytes.len()
        );

        Ok(FetchResponse { url: request.url.clone(), final_url, status, bytes, headers, fetch_ms, oversized })
    }
}
