//! The worker dispatcher.
//!
//! The host creates one [`ServiceWorker`] at start and calls its entry points
//! (`on_install`, `on_activate`, `on_fetch`, `on_message`, `on_push`, ...)
//! when the matching event occurs. Every entry point is an async method the
//! host awaits for completion.

use std::sync::Arc;

use lumina_core::events::{PERIODIC_UPDATE_LIBRARY, SYNC_READING_PROGRESS};
use lumina_core::{
    AppConfig, CacheStore, ClientAction, ControlMessage, Error, Notification, NotificationAction, Request, Response,
    classify,
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::fetch::{Network, resolve};
use crate::lifecycle::{LifecycleManager, LifecycleState};
use crate::offline::OfflineResponder;
use crate::strategy::StrategyEngine;

/// Result of dispatching a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker answered the request.
    Respond(Response),
    /// The worker did not intercept; the host performs the request natively.
    Passthrough,
}

/// Result of handling a control message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MessageOutcome {
    SkipWaiting { activated: bool },
    Cached { url: String },
    Cleared { namespaces: Vec<String> },
}

/// Offline cache worker for one application version.
pub struct ServiceWorker {
    config: AppConfig,
    origin: Url,
    network: Arc<dyn Network>,
    lifecycle: LifecycleManager,
    engine: StrategyEngine,
    offline: OfflineResponder,
}

impl ServiceWorker {
    /// Wire a worker over `store` and `network`.
    pub fn new(config: AppConfig, store: Arc<dyn CacheStore>, network: Arc<dyn Network>) -> Result<Self, Error> {
        let origin = Url::parse(&config.origin).map_err(|e| Error::InvalidUrl(format!("origin: {e}")))?;
        let offline_url = resolve(&origin, &config.offline_path).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let lifecycle = LifecycleManager::new(Arc::clone(&store), Arc::clone(&network), &config, &origin)?;
        let engine =
            StrategyEngine::new(Arc::clone(&store), Arc::clone(&network), config.cache_name(), offline_url.clone());
        let offline = OfflineResponder::new(store, offline_url);

        Ok(Self { config, origin, network, lifecycle, engine, offline })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub async fn state(&self) -> LifecycleState {
        self.lifecycle.state().await
    }

    /// Whether an installed version should be activated right away.
    pub async fn ready_to_activate(&self) -> bool {
        self.lifecycle.is_skip_waiting() && self.state().await == LifecycleState::Installed
    }

    /// Whether the active worker controls already-open clients.
    pub fn controls_clients(&self) -> bool {
        self.lifecycle.controls_clients()
    }

    /// Precache the manifest. Fails without storing anything if any entry fails.
    pub async fn on_install(&self) -> Result<(), Error> {
        self.lifecycle.install().await
    }

    /// Evict stale namespaces and claim clients. Returns the deleted namespaces.
    pub async fn on_activate(&self) -> Result<Vec<String>, Error> {
        self.lifecycle.activate().await
    }

    /// Handle an outbound request.
    ///
    /// Non-GET and non-HTTP requests, and every request while the worker is
    /// not active, pass through. Intercepted requests always get a response.
    pub async fn on_fetch(&self, request: &Request) -> FetchOutcome {
        if !request.is_get() || !request.is_http() {
            return FetchOutcome::Passthrough;
        }

        if self.state().await != LifecycleState::Active {
            return FetchOutcome::Passthrough;
        }

        let category = classify(request.url.path());
        let strategy = category.strategy(request.accepts_html());
        tracing::debug!(url = %request.url, %category, %strategy, "dispatching fetch");

        match self.engine.run(strategy, request).await {
            Ok(response) => FetchOutcome::Respond(response),
            Err(e) => {
                tracing::error!(url = %request.url, error = %e, "fetch error");
                FetchOutcome::Respond(self.offline.resolve(request).await)
            }
        }
    }

    /// Perform a request the worker chose not to intercept.
    pub async fn passthrough(&self, request: &Request) -> Result<Response, Error> {
        self.network.fetch(request).await
    }

    /// Handle a control message from a client.
    pub async fn on_message(&self, message: ControlMessage) -> Result<MessageOutcome, Error> {
        match message {
            ControlMessage::SkipWaiting => {
                self.lifecycle.skip_waiting();
                let activated = if self.state().await == LifecycleState::Installed {
                    self.on_activate().await?;
                    true
                } else {
                    false
                };
                Ok(MessageOutcome::SkipWaiting { activated })
            }
            ControlMessage::CacheBook { url } => {
                let url = resolve(&self.origin, &url).map_err(|e| Error::InvalidUrl(format!("{url}: {e}")))?;
                self.lifecycle.cache_url(url.clone()).await?;
                Ok(MessageOutcome::Cached { url: url.to_string() })
            }
            ControlMessage::ClearCache => {
                let namespaces = self.lifecycle.clear_all().await?;
                Ok(MessageOutcome::Cleared { namespaces })
            }
        }
    }

    /// Build the notification shown for a push. Always produces one.
    ///
    /// The payload text is the body as is, even when empty; without a
    /// payload the configured default body is used.
    pub fn on_push(&self, payload: Option<&str>) -> Notification {
        let body = payload.map_or_else(|| self.config.notification_body.clone(), str::to_string);

        Notification {
            title: self.config.notification_title.clone(),
            body,
            icon: self.config.notification_icon.clone(),
            badge: self.config.notification_badge.clone(),
            vibrate: vec![200, 100, 200],
            tag: self.config.notification_tag.clone(),
            actions: vec![
                NotificationAction { action: "open".into(), title: "Open".into() },
                NotificationAction { action: "close".into(), title: "Close".into() },
            ],
        }
    }

    /// React to a click on a notification. The notification is closed by the host.
    pub fn on_notification_click(&self, action: Option<&str>) -> Option<ClientAction> {
        if action != Some("open") {
            return None;
        }

        let root = self.origin.join("/").unwrap_or_else(|_| self.origin.clone());
        Some(ClientAction::OpenWindow { url: root.to_string() })
    }

    /// Background sync trigger. Reading progress upload lives outside the worker.
    pub async fn on_sync(&self, tag: &str) {
        if tag == SYNC_READING_PROGRESS {
            tracing::info!(tag, "syncing reading progress");
        } else {
            tracing::debug!(tag, "ignoring unknown sync tag");
        }
    }

    /// Periodic sync trigger. Library refresh lives outside the worker.
    pub async fn on_periodic_sync(&self, tag: &str) {
        if tag == PERIODIC_UPDATE_LIBRARY {
            tracing::info!(tag, "updating library in background");
        } else {
            tracing::debug!(tag, "ignoring unknown periodic sync tag");
        }
    }
}
