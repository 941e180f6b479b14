//! Last-resort responses for requests every strategy failed on.

use std::sync::Arc;

use lumina_core::{CacheStore, Request, Response};
use url::Url;

use crate::strategy::lookup;

/// Produces a response for any request without touching the network.
pub struct OfflineResponder {
    store: Arc<dyn CacheStore>,
    offline_url: Url,
}

impl OfflineResponder {
    pub fn new(store: Arc<dyn CacheStore>, offline_url: Url) -> Self {
        Self { store, offline_url }
    }

    /// Resolve `request` from the store, or synthesize a 503.
    ///
    /// HTML navigations get the offline page first, then a stored copy of
    /// the request itself.
    pub async fn resolve(&self, request: &Request) -> Response {
        if request.accepts_html()
            && let Some(page) = lookup(self.store.as_ref(), &Request::get(self.offline_url.clone())).await
        {
            return page;
        }

        if let Some(cached) = lookup(self.store.as_ref(), request).await {
            return cached;
        }

        tracing::debug!(url = %request.url, "nothing cached, answering 503");
        Response::service_unavailable()
    }
}
