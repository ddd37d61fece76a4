//! Proxy error types

use std::io;

use crate::protocol::JsonRpcError;

/// Protocol-level failures
///
/// Anything that goes wrong talking to the bridge is a tool result with
/// `isError`, not one of these.
#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    /// IO error (stdin/stdout)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool was called before `initialize`
    #[error("Server not initialized")]
    NotInitialized,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ProxyError> for JsonRpcError {
    fn from(err: ProxyError) -> Self {
        match err {
            ProxyError::MethodNotFound(method) => JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
            ),
            ProxyError::InvalidParams(msg) => JsonRpcError::new(JsonRpcError::INVALID_PARAMS, msg),
            ProxyError::UnknownTool(name) => JsonRpcError::new(
                JsonRpcError::METHOD_NOT_FOUND,
                format!("Unknown tool: {}", name),
            ),
            ProxyError::NotInitialized => {
                JsonRpcError::new(JsonRpcError::INVALID_REQUEST, "Server not initialized")
            }
            ProxyError::Io(err) => {
                JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, format!("IO error: {}", err))
            }
            ProxyError::Json(err) => {
                JsonRpcError::new(JsonRpcError::PARSE_ERROR, format!("JSON error: {}", err))
            }
            ProxyError::Internal(msg) => JsonRpcError::new(JsonRpcError::INTERNAL_ERROR, msg),
        }
    }
}
