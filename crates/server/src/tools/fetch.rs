//! sw_fetch tool implementation.
//!
//! Dispatches one request through the worker. Requests the worker does not
//! intercept are performed directly against the network.

use std::collections::BTreeMap;
use std::sync::Arc;

use lumina_client::{FetchOutcome, ServiceWorker, fetch::resolve};
use lumina_core::{Category, Request, Response, Strategy, classify};
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the configured origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Optional Accept header, e.g. "text/html" for a page navigation.
    #[serde(default)]
    pub accept: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    /// Whether the worker answered the request itself.
    pub intercepted: bool,
    pub category: Category,
    /// Strategy applied, absent for passthrough requests.
    pub strategy: Option<Strategy>,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
}

impl SwFetchOutput {
    fn new(request: &Request, strategy: Option<Strategy>, response: Response) -> Self {
        Self {
            url: request.url.to_string(),
            intercepted: strategy.is_some(),
            category: classify(request.url.path()),
            strategy,
            status: response.status,
            body: response.text(),
            status_text: response.status_text,
            headers: response.headers,
        }
    }
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &Arc<ServiceWorker>, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let method = params.method.trim();
    if method.is_empty() {
        return Err(ToolError::InvalidInput("method cannot be empty".into()).into());
    }

    let url = resolve(worker.origin(), &params.url).map_err(|e| ToolError::InvalidInput(format!("url: {e}")))?;
    let mut request = Request::new(method, url);
    if let Some(accept) = params.accept {
        request = request.header("accept", accept);
    }

    let output = match worker.on_fetch(&request).await {
        FetchOutcome::Respond(response) => {
            let strategy = classify(request.url.path()).strategy(request.accepts_html());
            SwFetchOutput::new(&request, Some(strategy), response)
        }
        FetchOutcome::Passthrough => {
            tracing::debug!(url = %request.url, method = %request.method, "passing request through");
            let response = worker.passthrough(&request).await?;
            SwFetchOutput::new(&request, None, response)
        }
    };

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{active_worker, output, worker};

    fn params(url: &str) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: default_method(), accept: None }
    }

    #[tokio::test]
    async fn test_fetch_intercepted_when_active() {
        let (worker, _store, _network) = active_worker().await;

        let result = fetch_impl(&worker, params("/static/css/output.css")).await.unwrap();
        let value = output(&result);
        assert_eq!(value["intercepted"], true);
        assert_eq!(value["category"], "static");
        assert_eq!(value["strategy"], "cache_first");
        assert_eq!(value["body"], "/static/css/output.css");
    }

    #[tokio::test]
    async fn test_fetch_offline_html_gets_offline_page() {
        let (worker, _store, network) = active_worker().await;
        network.set_online(false);

        let mut params = params("/book/42");
        params.accept = Some("text/html".into());
        let value = output(&fetch_impl(&worker, params).await.unwrap());
        assert_eq!(value["status"], 200);
        assert_eq!(value["body"], "/offline/");
    }

    #[tokio::test]
    async fn test_fetch_offline_miss_is_503() {
        let (worker, _store, network) = active_worker().await;
        network.set_online(false);

        let value = output(&fetch_impl(&worker, params("/search/")).await.unwrap());
        assert_eq!(value["status"], 503);
        assert_eq!(value["body"], "Offline");
    }

    #[tokio::test]
    async fn test_fetch_passthrough_before_install() {
        let (worker, store, _network) = worker().await;

        let value = output(&fetch_impl(&worker, params("/media/books/1.epub")).await.unwrap());
        assert_eq!(value["intercepted"], false);
        assert!(value["strategy"].is_null());
        assert!(lumina_core::CacheStore::keys(store.as_ref()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let (worker, _store, _network) = active_worker().await;

        let params = SwFetchParams { url: "/book/1/progress/".into(), method: "post".into(), accept: None };
        let value = output(&fetch_impl(&worker, params).await.unwrap());
        assert_eq!(value["intercepted"], false);
    }

    #[tokio::test]
    async fn test_fetch_passthrough_network_failure() {
        let (worker, _store, network) = worker().await;
        network.set_online(false);

        let err = fetch_impl(&worker, params("/")).await.unwrap_err();
        assert_eq!(err.code.0, -32000);
    }

    #[tokio::test]
    async fn test_fetch_rejects_bad_input() {
        let (worker, _store, _network) = worker().await;

        let err = fetch_impl(&worker, params("")).await.unwrap_err();
        assert_eq!(err.code.0, -32602);

        let err = fetch_impl(&worker, params("ftp://lumina.test/file")).await.unwrap_err();
        assert_eq!(err.code.0, -32602);

        let params = SwFetchParams { url: "/".into(), method: "  ".into(), accept: None };
        let err = fetch_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
