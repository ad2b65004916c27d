//! The offline cache worker: one deployed version of the site's caching
//! logic.
//!
//! Events are dispatched through an explicit table from [`EventKind`] to a
//! handler function, so registration happens once at construction and the
//! lifecycle, fetch and message paths stay independent of each other.

mod clients;
mod lifecycle;

pub use clients::ClientRegistry;
pub use lifecycle::WorkerState;

use crate::control::Command;
use crate::fetch::{FetchResponse, Network, Request, same_origin, validate_public};
use crate::router::{Route, route};
use crate::strategy::{BackgroundWrites, Served, StrategyContext, cache_first, network_first};
use futures_util::future::BoxFuture;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use stowaway_core::{AppConfig, CacheDb, Error, RequestIdentity};
use tokio::sync::{Mutex, RwLock};
use url::Url;

/// Kind of event delivered to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Install,
    Activate,
    Fetch,
    Message,
}

/// An event delivered to the worker.
#[derive(Debug, Clone)]
pub enum Event {
    Install,
    Activate,
    Fetch(Request),
    Message(Value),
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Install => EventKind::Install,
            Event::Activate => EventKind::Activate,
            Event::Fetch(_) => EventKind::Fetch,
            Event::Message(_) => EventKind::Message,
        }
    }
}

/// Result of handling one event.
#[derive(Debug)]
pub enum EventOutcome {
    /// Lifecycle state after the event.
    State(WorkerState),
    /// The worker answered the request.
    Respond(Served),
    /// The worker did not intercept; the caller handles it normally.
    PassThrough,
    /// Unrecognized message or unregistered event kind.
    Ignored,
}

type Handler = for<'a> fn(&'a Worker, Event) -> BoxFuture<'a, Result<EventOutcome, Error>>;

/// Snapshot of a worker for status reporting.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerStatus {
    pub app_name: String,
    pub version: String,
    pub cache_name: String,
    pub state: WorkerState,
    /// Cache currently answering fetches for the origin, if any version is active.
    pub serving_cache: Option<String>,
    pub skip_waiting: bool,
    pub clients: usize,
}

/// One version of the caching worker bound to an origin.
pub struct Worker {
    config: AppConfig,
    cache_name: String,
    origin: Url,
    scope: String,
    precache: Vec<Url>,
    offline_page: RequestIdentity,
    caches: CacheDb,
    network: Arc<dyn Network>,
    clients: ClientRegistry,
    state: RwLock<WorkerState>,
    serving: RwLock<Option<String>>,
    skip_waiting: AtomicBool,
    transition: Mutex<()>,
    writes: BackgroundWrites,
    handlers: HashMap<EventKind, Handler>,
}

impl Worker {
    /// Create a worker for the version described by `config`.
    ///
    /// Reads the origin's registration: if this version is already the
    /// active one the worker starts `Active` without reinstalling, otherwise
    /// it starts `Parsed` while the registered version keeps serving.
    pub async fn new(
        config: AppConfig, caches: CacheDb, network: Arc<dyn Network>, clients: ClientRegistry,
    ) -> Result<Self, Error> {
        let origin = config.origin_url()?;
        let precache = config.precache_urls()?;
        let offline_page = RequestIdentity::get(config.offline_url()?.as_str());
        let scope = origin.origin().ascii_serialization();
        let cache_name = config.cache_name();

        let mut serving = None;
        if let Some(registration) = caches.registration(&scope).await? {
            if caches.has_cache(&registration.active_cache).await? {
                serving = Some(registration.active_cache);
            } else {
                tracing::warn!(scope = %scope, cache = %registration.active_cache, "registered cache is missing");
            }
        }

        let state = if serving.as_deref() == Some(cache_name.as_str()) {
            tracing::info!(cache = %cache_name, "resuming active worker");
            WorkerState::Active
        } else {
            WorkerState::Parsed
        };

        let skip_waiting = AtomicBool::new(config.skip_waiting);

        Ok(Self {
            config,
            cache_name,
            origin,
            scope,
            precache,
            offline_page,
            caches,
            network,
            clients,
            state: RwLock::new(state),
            serving: RwLock::new(serving),
            skip_waiting,
            transition: Mutex::new(()),
            writes: BackgroundWrites::default(),
            handlers: handlers(),
        })
    }

    /// Deliver an event to its registered handler.
    pub async fn dispatch(&self, event: Event) -> Result<EventOutcome, Error> {
        let kind = event.kind();
        match self.handlers.get(&kind) {
            Some(handler) => handler(self, event).await,
            None => {
                tracing::debug!(?kind, "no handler registered");
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Handle a posted control message.
    pub async fn post_message(&self, data: &Value) -> Result<EventOutcome, Error> {
        match Command::parse(data) {
            Some(Command::SkipWaiting) => self.skip_waiting().await.map(EventOutcome::State),
            None => {
                tracing::debug!("ignoring message: {}", data);
                Ok(EventOutcome::Ignored)
            }
        }
    }

    /// Fetch a request the worker passed through, with no cache effects.
    ///
    /// Requests off the worker's origin are refused with `Error::Blocked`
    /// when their host resolves to a private or reserved address.
    pub async fn pass_through(&self, request: &Request) -> Result<FetchResponse, Error> {
        if !same_origin(&request.url, &self.origin) {
            validate_public(&request.url).await?;
        }
        self.network.fetch(request).await
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    pub async fn status(&self) -> WorkerStatus {
        WorkerStatus {
            app_name: self.config.app_name.clone(),
            version: self.config.version.clone(),
            cache_name: self.cache_name.clone(),
            state: self.state().await,
            serving_cache: self.serving_cache().await,
            skip_waiting: self.skip_waiting.load(Ordering::SeqCst),
            clients: self.clients.len().await,
        }
    }

    /// Cache currently answering fetches for the origin.
    pub async fn serving_cache(&self) -> Option<String> {
        self.serving.read().await.clone()
    }

    /// Wait for background cache writes spawned so far.
    pub async fn settle(&self) {
        self.writes.settle().await;
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn caches(&self) -> &CacheDb {
        &self.caches
    }

    pub fn clients(&self) -> &ClientRegistry {
        &self.clients
    }

    async fn handle_fetch(&self, request: Request) -> Result<EventOutcome, Error> {
        let serving = self.serving.read().await.clone();
        if let Some(client_id) = &request.client_id {
            self.clients.attach(client_id, serving.as_deref()).await;
        }

        let navigation = match route(&request, &self.origin) {
            Route::PassThrough => {
                tracing::debug!("passing through {} {}", request.method, request.url);
                return Ok(EventOutcome::PassThrough);
            }
            Route::NetworkFirst => true,
            Route::CacheFirst => false,
        };

        let Some(serving) = serving else {
            tracing::debug!("no active version, passing through {}", request.url);
            return Ok(EventOutcome::PassThrough);
        };

        let cache = self.caches.cache(&serving);
        let ctx = StrategyContext {
            network: self.network.as_ref(),
            cache: &cache,
            offline_page: &self.offline_page,
            writes: &self.writes,
        };

        let served = if navigation {
            network_first(&ctx, &request).await?
        } else {
            cache_first(&ctx, &request).await?
        };
        Ok(EventOutcome::Respond(served))
    }
}

fn handlers() -> HashMap<EventKind, Handler> {
    let mut table: HashMap<EventKind, Handler> = HashMap::new();
    table.insert(EventKind::Install, on_install);
    table.insert(EventKind::Activate, on_activate);
    table.insert(EventKind::Fetch, on_fetch);
    table.insert(EventKind::Message, on_message);
    table
}

fn on_install(worker: &Worker, _event: Event) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    Box::pin(async move { worker.install().await.map(EventOutcome::State) })
}

fn on_activate(worker: &Worker, _event: Event) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    Box::pin(async move { worker.activate().await.map(EventOutcome::State) })
}

fn on_fetch(worker: &Worker, event: Event) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    Box::pin(async move {
        match event {
            Event::Fetch(request) => worker.handle_fetch(request).await,
            _ => Ok(EventOutcome::Ignored),
        }
    })
}

fn on_message(worker: &Worker, event: Event) -> BoxFuture<'_, Result<EventOutcome, Error>> {
    Box::pin(async move {
        match event {
            Event::Message(data) => worker.post_message(&data).await,
            _ => Ok(EventOutcome::Ignored),
        }
    })
}
