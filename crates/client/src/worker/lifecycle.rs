//! Install/activate lifecycle and version cutover.
//!
//! ```text
//! Parsed ──install──▶ Installing ──ok──▶ Waiting ──▶ Activating ──▶ Active
//!                         │                 ▲  skip_waiting / no old clients
//!                         └──precache error─┴──▶ Redundant
//! ```
//!
//! Every transition holds the worker's transition lock, so install and
//! activate never interleave and the next phase only starts once the nested
//! cache work of the current one has completed.

use super::Worker;
use crate::fetch::{CacheMode, Request};
use futures_util::future::try_join_all;
use reqwest::Method;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::Ordering;
use stowaway_core::Error;

/// Lifecycle state of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    /// Constructed, never installed.
    Parsed,
    Installing,
    /// Installed; older clients are still attached.
    Waiting,
    Activating,
    Active,
    /// Install failed; this version never serves.
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WorkerState::Parsed => "parsed",
            WorkerState::Installing => "installing",
            WorkerState::Waiting => "waiting",
            WorkerState::Activating => "activating",
            WorkerState::Active => "active",
            WorkerState::Redundant => "redundant",
        };
        f.write_str(name)
    }
}

impl Worker {
    /// Install this version: populate its named cache with the precache set.
    ///
    /// All-or-nothing: a rejected fetch, a non-2xx status or a body over
    /// `max_bytes` stores nothing and
    /// fails with `Error::PrecacheFailed`, leaving the worker `Redundant`
    /// while the previously active version keeps serving. On success the
    /// worker activates right away when skip-waiting was requested or no
    /// client is controlled by an older version; otherwise it waits.
    ///
    /// Re-installing an active version refreshes the precached entries.
    pub async fn install(&self) -> Result<WorkerState, Error> {
        let _transition = self.transition.lock().await;
        let previous = self.state().await;

        if previous != WorkerState::Active {
            self.set_state(WorkerState::Installing).await;
        }
        tracing::info!(version = %self.config.version, cache = %self.cache_name, "installing worker");

        match self.precache().await {
            Ok(count) => tracing::info!(cache = %self.cache_name, count, "pre-cached critical assets"),
            Err(e) => {
                tracing::error!(cache = %self.cache_name, "pre-cache failed: {}", e);
                if previous != WorkerState::Active {
                    self.set_state(WorkerState::Redundant).await;
                }
                return Err(e);
            }
        }

        if previous == WorkerState::Active {
            return Ok(WorkerState::Active);
        }

        let old_clients = self.clients.controlled_by_others(&self.cache_name).await;
        if self.skip_waiting.load(Ordering::SeqCst) || old_clients == 0 {
            return self.activate_locked().await;
        }

        tracing::info!(old_clients, "waiting for older clients to close");
        self.set_state(WorkerState::Waiting).await;
        Ok(WorkerState::Waiting)
    }

    /// Activate an installed version: delete every other named cache, record
    /// the registration and claim all open clients.
    pub async fn activate(&self) -> Result<WorkerState, Error> {
        let _transition = self.transition.lock().await;
        self.activate_locked().await
    }

    /// Request activation without waiting for older clients to close.
    ///
    /// Takes effect immediately while `Waiting`; before that it is
    /// remembered for the next successful install.
    pub async fn skip_waiting(&self) -> Result<WorkerState, Error> {
        self.skip_waiting.store(true, Ordering::SeqCst);

        let _transition = self.transition.lock().await;
        match self.state().await {
            WorkerState::Waiting => self.activate_locked().await,
            state => Ok(state),
        }
    }

    /// A page context closed. When the last client of an older version
    /// goes away a waiting worker activates.
    pub async fn client_closed(&self, client_id: &str) -> Result<WorkerState, Error> {
        if !self.clients.remove(client_id).await {
            tracing::debug!(client_id, "unknown client closed");
        }

        let _transition = self.transition.lock().await;
        let state = self.state().await;
        if state == WorkerState::Waiting && self.clients.controlled_by_others(&self.cache_name).await == 0 {
            return self.activate_locked().await;
        }
        Ok(state)
    }

    /// Fetch the whole precache set with reload semantics and store it in
    /// one transaction. Returns the number of entries written.
    async fn precache(&self) -> Result<usize, Error> {
        let cache = self.caches.open_cache(&self.cache_name).await?;

        let fetches = self.precache.iter().map(|url| async move {
            let request = Request::from_url(Method::GET, url.clone()).with_cache_mode(CacheMode::Reload);
            match self.network.fetch(&request).await {
                Ok(response) if response.oversized => {
                    Err(Error::PrecacheFailed(format!("{url}: {} bytes exceeds max_bytes", response.bytes.len())))
                }
                Ok(response) if response.status.is_success() => Ok((request.identity(), response.to_stored())),
                Ok(response) => Err(Error::PrecacheFailed(format!("{url}: status {}", response.status.as_u16()))),
                Err(e) => Err(Error::PrecacheFailed(format!("{url}: {e}"))),
            }
        });

        let entries = try_join_all(fetches).await?;
        let count = entries.len();
        cache.put_all(entries).await?;
        Ok(count)
    }

    /// Caller must hold the transition lock.
    async fn activate_locked(&self) -> Result<WorkerState, Error> {
        let previous = self.state().await;
        if matches!(previous, WorkerState::Parsed | WorkerState::Redundant) {
            return Err(Error::InvalidState(format!("cannot activate {} while {}", self.cache_name, previous)));
        }

        self.set_state(WorkerState::Activating).await;
        tracing::info!(cache = %self.cache_name, "activating worker");

        match self.caches.cache_names().await {
            Ok(names) => {
                for name in names.into_iter().filter(|name| *name != self.cache_name) {
                    tracing::info!(cache = %name, "deleting old cache");
                    if let Err(e) = self.caches.delete_cache(&name).await {
                        tracing::warn!(cache = %name, "failed to delete old cache: {}", e);
                    }
                }
            }
            Err(e) => tracing::warn!("failed to enumerate caches: {}", e),
        }

        if let Err(e) = self.caches.set_registration(&self.scope, &self.cache_name).await {
            tracing::error!(scope = %self.scope, "failed to record registration: {}", e);
            self.set_state(previous).await;
            return Err(e);
        }
        *self.serving.write().await = Some(self.cache_name.clone());

        let claimed = self.clients.claim(&self.cache_name).await;
        tracing::info!(cache = %self.cache_name, claimed, "claimed clients");

        self.set_state(WorkerState::Active).await;
        Ok(WorkerState::Active)
    }

    async fn set_state(&self, next: WorkerState) {
        let mut state = self.state.write().await;
        if *state != next {
            tracing::debug!(version = %self.config.version, from = %*state, to = %next, "worker state changed");
            *state = next;
        }
    }
}
