//! Open page contexts and the cache version controlling each one.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry of open clients shared by every worker version of an origin.
///
/// Uses a HashMap behind a tokio RwLock; cloning shares the registry.
#[derive(Clone, Debug, Default)]
pub struct ClientRegistry {
    clients: Arc<RwLock<HashMap<String, Option<String>>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a client the first time it is seen.
    ///
    /// A known client keeps its controller; only `claim` rewrites it.
    pub async fn attach(&self, id: &str, controller: Option<&str>) {
        let mut clients = self.clients.write().await;
        clients
            .entry(id.to_string())
            .or_insert_with(|| controller.map(str::to_string));
    }

    /// Forget a closed client. Returns whether it was known.
    pub async fn remove(&self, id: &str) -> bool {
        self.clients.write().await.remove(id).is_some()
    }

    /// Cache name of the version controlling `id`.
    pub async fn controller(&self, id: &str) -> Option<String> {
        self.clients.read().await.get(id).cloned().flatten()
    }

    /// Make `cache_name` the controller of every open client.
    ///
    /// Returns how many clients changed controller.
    pub async fn claim(&self, cache_name: &str) -> usize {
        let mut clients = self.clients.write().await;
        let mut changed = 0;
        for controller in clients.values_mut() {
            if controller.as_deref() != Some(cache_name) {
                *controller = Some(cache_name.to_string());
                changed += 1;
            }
        }
        changed
    }

    /// Number of clients still controlled by a version other than `cache_name`.
    pub async fn controlled_by_others(&self, cache_name: &str) -> usize {
        self.clients
            .read()
            .await
            .values()
            .filter(|c| c.as_deref().is_some_and(|name| name != cache_name))
            .count()
    }

    pub async fn len(&self) -> usize {
        self.clients.read().await.len()
    }
}
