//! Stub network shared by the worker and strategy tests.

use crate::fetch::{CacheMode, FetchResponse, Network, Request};
use bytes::Bytes;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use stowaway_core::{AppConfig, CacheDb, Error};

pub const ORIGIN: &str = "https://blog.example.com";

/// Network stub that serves canned responses and records every call.
#[derive(Default)]
pub struct StubNetwork {
    routes: Mutex<HashMap<String, (StatusCode, &'static str, Vec<u8>)>>,
    calls: Mutex<Vec<(String, CacheMode)>>,
    offline: AtomicBool,
    /// Bodies longer than this are flagged oversized; 0 disables the limit.
    max_bytes: AtomicUsize,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` for `path` (relative to [`ORIGIN`]) or an absolute URL.
    pub fn serve(&self, path: &str, status: u16, content_type: &'static str, body: &str) {
        let url = if path.starts_with('/') { format!("{ORIGIN}{path}") } else { path.to_string() };
        self.routes.lock().unwrap().insert(
            url,
            (StatusCode::from_u16(status).unwrap(), content_type, body.as_bytes().to_vec()),
        );
    }

    /// Serve the default precache set with 200 responses.
    pub fn serve_site(&self) {
        self.serve("/", 200, "text/html", "<h1>home</h1>");
        self.serve("/posts/", 200, "text/html", "<h1>posts</h1>");
        self.serve("/about/", 200, "text/html", "<h1>about</h1>");
        self.serve("/offline.html", 200, "text/html", "<h1>offline</h1>");
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn set_max_bytes(&self, max_bytes: usize) {
        self.max_bytes.store(max_bytes, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn cache_modes(&self) -> Vec<CacheMode> {
        self.calls.lock().unwrap().iter().map(|(_, mode)| *mode).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait::async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error> {
        self.calls
            .lock()
            .unwrap()
            .push((request.url.to_string(), request.cache_mode));

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }

        let route = self.routes.lock().unwrap().get(request.url.as_str()).cloned();
        let (status, content_type, body) = route.unwrap_or((StatusCode::NOT_FOUND, "text/plain", b"not found".to_vec()));

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));

        let max_bytes = self.max_bytes.load(Ordering::SeqCst);
        let oversized = max_bytes > 0 && body.len() > max_bytes;

        Ok(FetchResponse {
            url: request.url.clone(),
            final_url: request.url.clone(),
            status,
            bytes: Bytes::from(body),
            headers,
            fetch_ms: 1,
            oversized,
        })
    }
}

pub fn config(version: &str) -> AppConfig {
    AppConfig { origin: ORIGIN.into(), version: version.into(), ..Default::default() }
}

pub async fn memory_db() -> CacheDb {
    CacheDb::open_in_memory().await.unwrap()
}
