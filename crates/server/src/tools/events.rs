//! Event tools: sw_push, sw_notification_click and sw_sync.

use std::sync::Arc;

use lumina_client::ServiceWorker;
use lumina_core::ClientAction;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::error::ToolError;

/// Input parameters for sw_push tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Push payload text, used as the notification body when present.
    #[serde(default)]
    pub payload: Option<String>,
}

/// Input parameters for sw_notification_click tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Identifier of the clicked action button, absent for a click on the body.
    #[serde(default)]
    pub action: Option<String>,
}

/// Output from the sw_notification_click tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickOutput {
    pub closed: bool,
    pub client_action: Option<ClientAction>,
}

/// Input parameters for sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncParams {
    /// Sync tag, e.g. "sync-reading-progress" or "update-library".
    pub tag: String,

    /// Deliver as a periodic sync instead of a one-off background sync.
    #[serde(default)]
    pub periodic: bool,
}

/// Output from the sw_sync tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwSyncOutput {
    pub tag: String,
    pub periodic: bool,
    pub handled: bool,
}

/// Implementation of the sw_push tool.
pub async fn push_impl(worker: &Arc<ServiceWorker>, params: SwPushParams) -> Result<CallToolResult, McpError> {
    let notification = worker.on_push(params.payload.as_deref());
    json_result(&notification)
}

/// Implementation of the sw_notification_click tool.
pub async fn notification_click_impl(
    worker: &Arc<ServiceWorker>, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    let client_action = worker.on_notification_click(params.action.as_deref());
    json_result(&SwNotificationClickOutput { closed: true, client_action })
}

/// Implementation of the sw_sync tool.
pub async fn sync_impl(worker: &Arc<ServiceWorker>, params: SwSyncParams) -> Result<CallToolResult, McpError> {
    let tag = params.tag.trim();
    if tag.is_empty() {
        return Err(ToolError::InvalidInput("tag cannot be empty".into()).into());
    }

    let handled = if params.periodic {
        worker.on_periodic_sync(tag).await;
        tag == lumina_core::events::PERIODIC_UPDATE_LIBRARY
    } else {
        worker.on_sync(tag).await;
        tag == lumina_core::events::SYNC_READING_PROGRESS
    };

    json_result(&SwSyncOutput { tag: tag.to_string(), periodic: params.periodic, handled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{output, worker};

    #[tokio::test]
    async fn test_push_with_payload() {
        let (worker, _store, _network) = worker().await;

        let params = SwPushParams { payload: Some("New chapter available".into()) };
        let value = output(&push_impl(&worker, params).await.unwrap());
        assert_eq!(value["title"], "Lumina Reader");
        assert_eq!(value["body"], "New chapter available");
        assert_eq!(value["tag"], "lumina-notification");
        assert_eq!(value["vibrate"], serde_json::json!([200, 100, 200]));
        assert_eq!(value["actions"][0]["action"], "open");
        assert_eq!(value["actions"][1]["action"], "close");
    }

    #[tokio::test]
    async fn test_push_without_payload_uses_default_body() {
        let (worker, _store, _network) = worker().await;

        let value = output(&push_impl(&worker, SwPushParams::default()).await.unwrap());
        assert_eq!(value["body"], "New notification");
    }

    #[tokio::test]
    async fn test_click_open_focuses_app_root() {
        let (worker, _store, _network) = worker().await;

        let params = SwNotificationClickParams { action: Some("open".into()) };
        let value = output(&notification_click_impl(&worker, params).await.unwrap());
        assert_eq!(value["closed"], true);
        assert_eq!(value["client_action"]["kind"], "open_window");
        assert_eq!(value["client_action"]["url"], "https://lumina.test/");
    }

    #[tokio::test]
    async fn test_click_close_only_closes() {
        let (worker, _store, _network) = worker().await;

        let params = SwNotificationClickParams { action: Some("close".into()) };
        let value = output(&notification_click_impl(&worker, params).await.unwrap());
        assert_eq!(value["closed"], true);
        assert!(value["client_action"].is_null());
    }

    #[tokio::test]
    async fn test_sync_tags() {
        let (worker, _store, _network) = worker().await;

        let params = SwSyncParams { tag: "sync-reading-progress".into(), periodic: false };
        assert_eq!(output(&sync_impl(&worker, params).await.unwrap())["handled"], true);

        let params = SwSyncParams { tag: "update-library".into(), periodic: true };
        assert_eq!(output(&sync_impl(&worker, params).await.unwrap())["handled"], true);

        let params = SwSyncParams { tag: "update-library".into(), periodic: false };
        assert_eq!(output(&sync_impl(&worker, params).await.unwrap())["handled"], false);
    }

    #[tokio::test]
    async fn test_sync_empty_tag_rejected() {
        let (worker, _store, _network) = worker().await;

        let params = SwSyncParams { tag: " ".into(), periodic: false };
        let err = sync_impl(&worker, params).await.unwrap_err();
        assert_eq!(err.code.0, -32602);
    }
}
