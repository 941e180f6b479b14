//! Errors raised by the tool layer before the worker is reached.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Malformed tool arguments.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// The tool result could not be encoded.
    #[error("ENCODE_FAILED: {0}")]
    Encode(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let code = match &err {
            ToolError::InvalidInput(_) => -32602,
            ToolError::Encode(_) => -32603,
        };

        McpError { code: ErrorCode(code), message: err.to_string().into(), data: None }
    }
}
