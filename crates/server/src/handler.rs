//! MCP server handler implementation.
//!
//! This module defines the server handler that routes tool calls to the
//! worker entry points.
use std::sync::Arc;

use crate::tools::{
    SwFetchParams, SwMessageParams, SwNotificationClickParams, SwPushParams, SwSyncParams, events, fetch, lifecycle,
    message,
};

use lumina_client::ServiceWorker;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for lumina-sw.
#[derive(Clone)]
pub struct LuminaServer {
    worker: Arc<ServiceWorker>,
    tool_router: ToolRouter<Self>,
}

/// Tool router implementation using the #[tool_router] macro.
#[tool_router]
impl LuminaServer {
    /// Create a new server handler around a worker.
    pub fn new(worker: Arc<ServiceWorker>) -> Self {
        Self { worker, tool_router: Self::tool_router() }
    }

    #[tool(
        description = "Dispatch a request through the offline cache worker. Returns status, headers, body, and the strategy applied."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch::fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Precache the application shell. Fails without storing anything if any entry fails.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        lifecycle::install_impl(&self.worker).await
    }

    /// Evict earlier cache versions and take control of clients.
    #[tool(description = "Activate the installed version, deleting caches of earlier versions.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        lifecycle::activate_impl(&self.worker).await
    }

    #[tool(description = "Post a control message: SKIP_WAITING, CACHE_BOOK {url}, or CLEAR_CACHE.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message::message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push message. Returns the notification that would be shown.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        events::push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Click a notification, optionally on an action button. Returns the resulting client action.")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        events::notification_click_impl(&self.worker, params.0).await
    }

    #[tool(description = "Trigger a background or periodic sync by tag.")]
    async fn sw_sync(&self, params: Parameters<SwSyncParams>) -> Result<CallToolResult, McpError> {
        events::sync_impl(&self.worker, params.0).await
    }

    #[tool(description = "Report the worker lifecycle state and current cache namespace.")]
    async fn sw_status(&self) -> Result<CallToolResult, McpError> {
        lifecycle::status_impl(&self.worker).await
    }
}

impl ServerHandler for LuminaServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "lumina-sw".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(
                "Offline asset cache for the Lumina reader. Install and activate, then route requests with sw_fetch."
                    .into(),
            ),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
