//! Unified error types for the offline cache worker.
//!
//! `CacheMiss` is handled locally by every strategy and should never reach a
//! caller of the dispatcher. `NetworkFailure` is recovered by the strategies
//! when possible and otherwise converted into a response by the offline
//! responder.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error type for the worker.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The fetch failed, was aborted, or returned a status the caller refuses.
    #[error("NETWORK_FAILURE: {0}")]
    NetworkFailure(String),

    /// No stored entry matches the request.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// A precache manifest entry could not be fetched during install.
    #[error("PRECACHE_FAILED: {url}: {reason}")]
    PrecacheFailure { url: String, reason: String },

    /// Database operation failed.
    #[error("STORAGE_FAILURE: {0}")]
    Database(tokio_rusqlite::Error),

    /// A stored row could not be decoded.
    #[error("STORAGE_FAILURE: {0}")]
    Storage(String),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Lifecycle step requested from a state that does not allow it.
    #[error("LIFECYCLE: {0}")]
    Lifecycle(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Storage(format!("headers json: {err}"))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::NetworkFailure(msg) => (-32000, msg.clone()),
            Error::CacheMiss(msg) => (-32001, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::Storage(msg) => (-32002, msg.clone()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::PrecacheFailure { .. } => (-32004, err.to_string()),
            Error::Lifecycle(msg) => (-32005, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("/static/app.js".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("/static/app.js"));
    }

    #[test]
    fn test_precache_failure_display() {
        let err = Error::PrecacheFailure { url: "/offline/".into(), reason: "status 404".into() };
        assert_eq!(err.to_string(), "PRECACHE_FAILED: /offline/: status 404");
    }

    #[test]
    fn test_error_to_mcp_error() {
        let err = Error::NetworkFailure("connection refused".to_string());
        let mcp_err: McpError = err.into();
        assert_eq!(mcp_err.code.0, -32000);
    }
}
