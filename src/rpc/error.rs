//! Normalized RPC error shape.

use thiserror::Error;

/// Errors that can occur during RPC operations.
///
/// Network, HTTP, and protocol-level failures all map here so higher
/// components see a single error surface.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Connection-level failure (refused, reset, DNS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The request exceeded its deadline.
    #[error("request timed out after {0} seconds")]
    Timeout(u64),

    /// The endpoint answered with a non-2xx HTTP status.
    #[error("HTTP status {0}")]
    Http(u16),

    /// The endpoint returned a JSON-RPC `error` object.
    #[error("RPC error {code}: {message}")]
    Protocol { code: i64, message: String },

    /// The response body could not be decoded into the expected shape.
    #[error("invalid response: {0}")]
    Decode(String),

    /// The configured endpoint URL is invalid.
    #[error("invalid endpoint URL: {0}")]
    Endpoint(String),
}

impl RpcError {
    /// Whether a retry of an idempotent read call may succeed.
    ///
    /// Protocol and decode errors are deterministic; retrying them only
    /// repeats the failure.
    pub fn is_retryable(&self) -> bool {
        match self {
            RpcError::Transport(_) | RpcError::Timeout(_) => true,
            RpcError::Http(status) => *status >= 500,
            RpcError::Protocol { .. } | RpcError::Decode(_) | RpcError::Endpoint(_) => false,
        }
    }
}

/// Result type for RPC operations.
pub type RpcResult<T> = Result<T, RpcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(RpcError::Timeout(10).is_retryable());
        assert!(RpcError::Transport("connection refused".into()).is_retryable());
        assert!(RpcError::Http(503).is_retryable());
        assert!(!RpcError::Http(404).is_retryable());
        assert!(!RpcError::Protocol {
            code: -32601,
            message: "method not found".into()
        }
        .is_retryable());
        assert!(!RpcError::Decode("missing field".into()).is_retryable());
    }

    #[test]
    fn display_includes_protocol_code() {
        let err = RpcError::Protocol {
            code: -32602,
            message: "invalid params".into(),
        };
        assert_eq!(err.to_string(), "RPC error -32602: invalid params");
    }
}
