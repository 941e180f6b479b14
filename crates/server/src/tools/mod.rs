//! MCP tool implementations.
//!
//! Each tool drives one entry point of the worker and returns its result as
//! pretty-printed JSON text.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use serde::Serialize;

use crate::error::ToolError;

pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod message;

pub use events::{SwNotificationClickParams, SwPushParams, SwSyncParams};
pub use fetch::SwFetchParams;
pub use message::SwMessageParams;

/// Encode `output` as the text content of a successful tool result.
pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Encode(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}
