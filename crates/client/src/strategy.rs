//! Caching strategies.
//!
//! Each strategy is a short sequence over cache lookup and network fetch:
//!
//! | strategy                     | first   | on failure | last resort  |
//! |------------------------------|---------|------------|--------------|
//! | cache-first                  | cache   | network    | error        |
//! | network-first                | network | cache      | error        |
//! | network-first-with-offline   | network | cache      | offline page |
//!
//! Only successful (2xx) network responses are written to the current
//! namespace. Writes are best effort: a failed write is logged and the
//! network response is still returned.

use std::sync::Arc;

use lumina_core::{CacheStore, Error, Request, Response, Strategy};
use url::Url;

use crate::fetch::Network;

/// Look up a request in every namespace.
async fn find(store: &dyn CacheStore, request: &Request) -> Result<Response, Error> {
    store
        .match_any(request)
        .await?
        .ok_or_else(|| Error::CacheMiss(request.url.to_string()))
}

/// [`find`], with misses and store failures both reported as `None`.
pub(crate) async fn lookup(store: &dyn CacheStore, request: &Request) -> Option<Response> {
    match find(store, request).await {
        Ok(hit) => Some(hit),
        Err(Error::CacheMiss(url)) => {
            tracing::debug!(%url, "cache miss");
            None
        }
        Err(e) => {
            tracing::warn!(url = %request.url, error = %e, "cache lookup failed, treating as miss");
            None
        }
    }
}

/// Runs the caching strategies against a store and a network.
pub struct StrategyEngine {
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    cache_name: String,
    offline_url: Url,
}

impl StrategyEngine {
    pub fn new(store: Arc<dyn CacheStore>, network: Arc<dyn Network>, cache_name: String, offline_url: Url) -> Self {
        Self { store, network, cache_name, offline_url }
    }

    /// Run `strategy` for `request`.
    pub async fn run(&self, strategy: Strategy, request: &Request) -> Result<Response, Error> {
        match strategy {
            Strategy::CacheFirst => self.cache_first(request).await,
            Strategy::NetworkFirst => self.network_first(request).await,
            Strategy::NetworkFirstWithOffline => self.network_first_with_offline(request).await,
        }
    }

    /// Serve from the store when possible, otherwise fetch and store.
    ///
    /// A network failure on a miss is returned to the caller as is.
    pub async fn cache_first(&self, request: &Request) -> Result<Response, Error> {
        if let Some(cached) = lookup(self.store.as_ref(), request).await {
            tracing::debug!(url = %request.url, "cache-first hit");
            return Ok(cached);
        }

        self.fetch_and_store(request).await.inspect_err(|_| {
            tracing::debug!(url = %request.url, "cache-first failed");
        })
    }

    /// Fetch and store, falling back to the store when the network fails.
    pub async fn network_first(&self, request: &Request) -> Result<Response, Error> {
        match self.fetch_and_store(request).await {
            Ok(response) => Ok(response),
            Err(err) => match lookup(self.store.as_ref(), request).await {
                Some(cached) => {
                    tracing::debug!(url = %request.url, "network-first served from cache");
                    Ok(cached)
                }
                None => Err(err),
            },
        }
    }

    /// Like [`network_first`](Self::network_first), with the precached offline
    /// page as a last resort.
    pub async fn network_first_with_offline(&self, request: &Request) -> Result<Response, Error> {
        match self.fetch_and_store(request).await {
            Ok(response) => Ok(response),
            Err(err) => {
                if let Some(cached) = lookup(self.store.as_ref(), request).await {
                    return Ok(cached);
                }

                let offline = Request::get(self.offline_url.clone());
                match lookup(self.store.as_ref(), &offline).await {
                    Some(page) => {
                        tracing::debug!(url = %request.url, "serving offline page");
                        Ok(page)
                    }
                    None => Err(err),
                }
            }
        }
    }

    async fn fetch_and_store(&self, request: &Request) -> Result<Response, Error> {
        let response = self.network.fetch(request).await?;
        if response.is_success() {
            self.persist(request, &response).await;
        }
        Ok(response)
    }

    async fn persist(&self, request: &Request, response: &Response) {
        if let Err(e) = self.store.put(&self.cache_name, request, response).await {
            tracing::warn!(url = %request.url, error = %e, "failed to store response");
        }
    }
}
