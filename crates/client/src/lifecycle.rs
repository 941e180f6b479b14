//! Namespace lifecycle: install, activate, explicit population and eviction.
//!
//! ```text
//! uninstalled -> installing -> installed -> activating -> active
//!                     \
//!                      -> redundant (precache failed)
//! ```
//!
//! Install and activate are serialized: a step is refused while another one
//! is in flight.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lumina_core::{AppConfig, CacheStore, Credentials, Error, Request, Response};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::task::JoinSet;
use url::Url;

use crate::fetch::{Network, resolve};

/// Lifecycle state of the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    Uninstalled,
    Installing,
    /// Installed and waiting to be activated.
    Installed,
    Activating,
    Active,
    /// Install failed, this version will never activate.
    Redundant,
}

/// Owns the namespace versioning of one application version.
pub struct LifecycleManager {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    cache_name: String,
    namespace_prefix: String,
    manifest: Vec<Url>,
    state: RwLock<LifecycleState>,
    skip_waiting: AtomicBool,
    clients_claimed: AtomicBool,
}

impl LifecycleManager {
    /// Create a manager for the version described by `config`.
    ///
    /// Manifest entries are resolved against `origin`.
    pub fn new(
        store: Arc<dyn CacheStore>, network: Arc<dyn Network>, config: &AppConfig, origin: &Url,
    ) -> Result<Self, Error> {
        let manifest = config
            .precache_urls
            .iter()
            .map(|path| resolve(origin, path).map_err(|e| Error::InvalidUrl(format!("{path}: {e}"))))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            store,
            network,
            cache_name: config.cache_name(),
            namespace_prefix: config.namespace_prefix(),
            manifest,
            state: RwLock::new(LifecycleState::Uninstalled),
            skip_waiting: AtomicBool::new(false),
            clients_claimed: AtomicBool::new(false),
        })
    }

    pub async fn state(&self) -> LifecycleState {
        *self.state.read().await
    }

    /// Name of the namespace this version writes to.
    pub fn cache_name(&self) -> &str {
        &self.cache_name
    }

    /// Whether a waiting install should be activated without delay.
    pub fn is_skip_waiting(&self) -> bool {
        self.skip_waiting.load(Ordering::SeqCst)
    }

    /// Ask for activation as soon as install completes.
    pub fn skip_waiting(&self) {
        self.skip_waiting.store(true, Ordering::SeqCst);
    }

    /// Whether activation has taken control of already-open clients.
    pub fn controls_clients(&self) -> bool {
        self.clients_claimed.load(Ordering::SeqCst)
    }

    async fn transition(&self, allowed: &[LifecycleState], next: LifecycleState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if !allowed.contains(&*state) {
            return Err(Error::Lifecycle(format!("cannot move from {:?} to {:?}", *state, next)));
        }
        *state = next;
        Ok(())
    }

    async fn set_state(&self, next: LifecycleState) {
        *self.state.write().await = next;
    }

    /// Precache the manifest into the current namespace.
    ///
    /// Every entry is fetched before anything is written; any failed fetch or
    /// non-success status fails the whole install and nothing is stored.
    pub async fn install(&self) -> Result<(), Error> {
        self.transition(&[LifecycleState::Uninstalled, LifecycleState::Redundant], LifecycleState::Installing)
            .await?;
        tracing::info!(cache = %self.cache_name, entries = self.manifest.len(), "installing");

        match self.precache().await {
            Ok(()) => {
                self.set_state(LifecycleState::Installed).await;
                self.skip_waiting();
                tracing::info!(cache = %self.cache_name, "installation complete");
                Ok(())
            }
            Err(e) => {
                self.set_state(LifecycleState::Redundant).await;
                tracing::error!(cache = %self.cache_name, error = %e, "precaching failed");
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<(), Error> {
        let mut join_set = JoinSet::new();
        let mut tasks = HashMap::new();
        for (index, url) in self.manifest.iter().enumerate() {
            let network = Arc::clone(&self.network);
            let request = Request::get(url.clone()).credentials(Credentials::SameOrigin);
            let handle = join_set.spawn(async move {
                let result = network.fetch(&request).await;
                (index, request, result)
            });
            tasks.insert(handle.id(), url);
        }

        let mut fetched: Vec<Option<(Request, Response)>> = vec![None; self.manifest.len()];
        while let Some(joined) = join_set.join_next().await {
            let (index, request, result) = joined.map_err(|e| Error::PrecacheFailure {
                url: tasks.get(&e.id()).map_or_else(|| self.cache_name.clone(), |url| url.to_string()),
                reason: format!("fetch task failed: {e}"),
            })?;

            let url = request.url.to_string();
            let response = result.map_err(|e| Error::PrecacheFailure { url: url.clone(), reason: e.to_string() })?;
            if !response.is_success() {
                return Err(Error::PrecacheFailure { url, reason: format!("status {}", response.status) });
            }
            fetched[index] = Some((request, response));
        }

        self.store.open(&self.cache_name).await?;
        self.store
            .put_all(&self.cache_name, fetched.into_iter().flatten().collect())
            .await
    }

    /// Delete every namespace of this application except the current one,
    /// then claim clients.
    ///
    /// Returns the deleted namespace names.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.transition(&[LifecycleState::Installed], LifecycleState::Activating)
            .await?;
        tracing::info!(cache = %self.cache_name, "activating");

        match self.evict(|name| name != self.cache_name).await {
            Ok(deleted) => {
                self.set_state(LifecycleState::Active).await;
                self.clients_claimed.store(true, Ordering::SeqCst);
                tracing::info!(cache = %self.cache_name, deleted = deleted.len(), "activation complete");
                Ok(deleted)
            }
            Err(e) => {
                self.set_state(LifecycleState::Installed).await;
                Err(e)
            }
        }
    }

    /// Fetch `url` and store it in the current namespace.
    ///
    /// A non-success status is reported as a network failure and not stored.
    pub async fn cache_url(&self, url: Url) -> Result<(), Error> {
        let request = Request::get(url).credentials(Credentials::SameOrigin);
        let response = self.network.fetch(&request).await?;
        if !response.is_success() {
            return Err(Error::NetworkFailure(format!("{}: status {}", request.url, response.status)));
        }

        self.store.put(&self.cache_name, &request, &response).await?;
        tracing::info!(url = %request.url, "cached for offline use");
        Ok(())
    }

    /// Delete every namespace of this application, whatever its version.
    pub async fn clear_all(&self) -> Result<Vec<String>, Error> {
        let deleted = self.evict(|_| true).await?;
        tracing::info!(deleted = deleted.len(), "cleared caches");
        Ok(deleted)
    }

    /// Namespaces of this application are `<app_name>-` followed by a
    /// version, so an app named `lumina` does not own `lumina-reader-v1.0.0`.
    fn owns_namespace(&self, name: &str) -> bool {
        name.strip_prefix(&self.namespace_prefix)
            .and_then(|version| version.chars().next())
            .is_some_and(|first| first == 'v' || first.is_ascii_digit())
    }

    async fn evict(&self, should_delete: impl Fn(&str) -> bool) -> Result<Vec<String>, Error> {
        let mut deleted = Vec::new();
        for name in self.store.keys().await? {
            if self.owns_namespace(&name) && should_delete(&name) {
                tracing::info!(cache = %name, "deleting cache");
                if self.store.delete(&name).await? {
                    deleted.push(name);
                }
            }
        }
        Ok(deleted)
    }
}
