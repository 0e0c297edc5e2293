//! Transport and provider error types.

use thiserror::Error;

use starkcodec_core::CodecError;

use crate::request::JsonRpcError;

/// Errors that can occur while moving a request to the node and back.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, non-2xx status, bad body).
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {}: {}", .0.code, .0.message)]
    Rpc(JsonRpcError),

    /// Request timed out after the configured duration.
    #[error("Request timed out after {ms}ms")]
    Timeout { ms: u64 },

    /// Response envelope could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl TransportError {
    /// Returns `true` if this error is transient and the request may be sent again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Timeout { .. })
    }

    /// Returns `true` if the node answered with an error object.
    pub fn is_execution_error(&self) -> bool {
        matches!(self, Self::Rpc(_))
    }
}

/// Errors surfaced by [`StarknetProvider`](crate::StarknetProvider).
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Transport(TransportError),

    /// The node rejected the call.
    #[error("{method} failed: {error}")]
    Rpc { method: String, error: JsonRpcError },

    /// The request could not be encoded or the result could not be decoded.
    #[error("{method}: {source}")]
    Codec {
        method: String,
        #[source]
        source: CodecError,
    },
}

impl ProviderError {
    pub(crate) fn codec(method: &str, source: CodecError) -> Self {
        Self::Codec {
            method: method.to_string(),
            source,
        }
    }

    pub(crate) fn transport(method: &str, err: TransportError) -> Self {
        match err {
            TransportError::Rpc(error) => Self::Rpc {
                method: method.to_string(),
                error,
            },
            other => Self::Transport(other),
        }
    }

    /// The node's error object, if the node answered with one.
    pub fn rpc_error(&self) -> Option<&JsonRpcError> {
        match self {
            Self::Rpc { error, .. } => Some(error),
            _ => None,
        }
    }

    /// The codec failure, if encoding or decoding went wrong.
    pub fn codec_error(&self) -> Option<&CodecError> {
        match self {
            Self::Codec { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(TransportError::Http("connection refused".into()).is_retryable());
        assert!(TransportError::Timeout { ms: 30_000 }.is_retryable());
        let rpc = TransportError::Rpc(JsonRpcError { code: 24, message: "Block not found".into(), data: None });
        assert!(!rpc.is_retryable());
        assert!(rpc.is_execution_error());
        assert!(!TransportError::Other("closed".into()).is_retryable());
    }

    #[test]
    fn rpc_errors_are_lifted_out_of_transport() {
        let err = ProviderError::transport(
            "starknet_getNonce",
            TransportError::Rpc(JsonRpcError { code: 20, message: "Contract not found".into(), data: None }),
        );
        assert_eq!(err.rpc_error().unwrap().code, 20);
        assert_eq!(
            err.to_string(),
            "starknet_getNonce failed: JSON-RPC error 20: Contract not found"
        );

        let err = ProviderError::transport("starknet_getNonce", TransportError::Timeout { ms: 5 });
        assert!(matches!(err, ProviderError::Transport(TransportError::Timeout { ms: 5 })));
        assert!(err.rpc_error().is_none());
    }
}
