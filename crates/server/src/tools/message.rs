//! sw_message tool implementation.
//!
//! Posts a control message to the worker, as a page would.

use std::sync::Arc;

use lumina_client::ServiceWorker;
use lumina_core::ControlMessage;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;

/// Input parameters for sw_message tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// One of `{"type": "SKIP_WAITING"}`, `{"type": "CACHE_BOOK", "url": "..."}`
    /// or `{"type": "CLEAR_CACHE"}`.
    pub message: ControlMessage,
}

/// Implementation of the sw_message tool.
pub async fn message_impl(worker: &Arc<ServiceWorker>, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    tracing::debug!(message = ?params.message, "control message");
    let outcome = worker.on_message(params.message).await?;
    json_result(&outcome)
}
