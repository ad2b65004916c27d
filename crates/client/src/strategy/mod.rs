//! Fetch strategies against the serving named cache.
//!
//! - **Network-first** keeps documents fresh when the origin is reachable and
//!   falls back to the cache, then to the offline page.
//! - **Cache-first** answers assets from the cache without touching the
//!   network and only fetches on a miss.
//!
//! Both write a copy of every 200 network response in the background. The
//! write never delays or fails the response handed back to the caller.

mod cache_first;
mod network_first;

pub use cache_first::cache_first;
pub use network_first::network_first;

use crate::fetch::{FetchResponse, Network};
use serde::Serialize;
use std::sync::Mutex;
use stowaway_core::{NamedCache, RequestIdentity, StoredResponse};
use tokio::task::JoinSet;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    OfflineFallback,
}

/// A response produced by a strategy.
#[derive(Debug, Clone)]
pub enum Served {
    Network(FetchResponse),
    Cache(StoredResponse),
    OfflineFallback(StoredResponse),
}

impl Served {
    pub fn source(&self) -> ResponseSource {
        match self {
            Served::Network(_) => ResponseSource::Network,
            Served::Cache(_) => ResponseSource::Cache,
            Served::OfflineFallback(_) => ResponseSource::OfflineFallback,
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Served::Network(r) => r.status.as_u16(),
            Served::Cache(r) | Served::OfflineFallback(r) => r.status,
        }
    }

    pub fn body(&self) -> &[u8] {
        match self {
            Served::Network(r) => &r.bytes,
            Served::Cache(r) | Served::OfflineFallback(r) => &r.body,
        }
    }

    pub fn headers(&self) -> Vec<(String, String)> {
        match self {
            Served::Network(r) => r.header_pairs(),
            Served::Cache(r) | Served::OfflineFallback(r) => r.headers.clone(),
        }
    }

    /// URL the response was produced for (after redirects).
    pub fn url(&self) -> String {
        match self {
            Served::Network(r) => r.final_url.to_string(),
            Served::Cache(r) | Served::OfflineFallback(r) => r.url.clone(),
        }
    }
}

/// Cache writes still in flight after their response was returned.
#[derive(Debug, Default)]
pub struct BackgroundWrites {
    tasks: Mutex<JoinSet<()>>,
}

impl BackgroundWrites {
    /// Store a copy of `response` without waiting for the write.
    ///
    /// Write failures (deleted cache, full disk) are logged and dropped.
    pub fn put(&self, cache: NamedCache, identity: RequestIdentity, response: StoredResponse) {
        let task = async move {
            match cache.put(&identity, &response).await {
                Ok(()) => tracing::debug!(cache = cache.name(), "cached {}", identity),
                Err(e) => tracing::warn!(cache = cache.name(), "cache write failed for {}: {}", identity, e),
            }
        };

        let mut tasks = match self.tasks.lock() {
            Ok(tasks) => tasks,
            Err(poisoned) => poisoned.into_inner(),
        };
        // reap finished writes so the set only holds in-flight ones
        while tasks.try_join_next().is_some() {}
        tasks.spawn(task);
    }

    /// Wait until every write spawned so far has finished.
    pub async fn settle(&self) {
        let mut pending = {
            let mut tasks = match self.tasks.lock() {
                Ok(tasks) => tasks,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *tasks)
        };

        while let Some(result) = pending.join_next().await {
            if let Err(e) = result {
                tracing::warn!("cache write task aborted: {e}");
            }
        }
    }
}

/// Everything a strategy needs to answer one request.
pub struct StrategyContext<'a> {
    pub network: &'a dyn Network,
    /// Cache of the version currently serving the origin.
    pub cache: &'a NamedCache,
    /// Identity of the offline fallback page.
    pub offline_page: &'a RequestIdentity,
    pub writes: &'a BackgroundWrites,
}
