//! JSON-RPC 2.0 wire types.
//!
//! The `result` member of a response is kept as raw JSON text so that the
//! envelope resolvers decode it straight from the bytes the node sent.

use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use serde_json::Value;

/// JSON-RPC request ID: number, string, or null.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request. Starknet methods take their parameters by name,
/// so `params` is usually an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: RpcId,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id: RpcId::Number(id),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    /// Name of the Starknet API error behind `code`, if it is one.
    pub fn starknet_error(&self) -> Option<&'static str> {
        let name = match self.code {
            1 => "FAILED_TO_RECEIVE_TXN",
            20 => "CONTRACT_NOT_FOUND",
            21 => "INVALID_MESSAGE_SELECTOR",
            24 => "BLOCK_NOT_FOUND",
            27 => "INVALID_TXN_INDEX",
            28 => "CLASS_HASH_NOT_FOUND",
            29 => "TXN_HASH_NOT_FOUND",
            40 => "CONTRACT_ERROR",
            41 => "TRANSACTION_EXECUTION_ERROR",
            51 => "CLASS_ALREADY_DECLARED",
            52 => "INVALID_TRANSACTION_NONCE",
            53 => "INSUFFICIENT_MAX_FEE",
            54 => "INSUFFICIENT_ACCOUNT_BALANCE",
            55 => "VALIDATION_FAILURE",
            56 => "COMPILATION_FAILED",
            57 => "CONTRACT_CLASS_SIZE_IS_TOO_LARGE",
            58 => "NON_ACCOUNT",
            59 => "DUPLICATE_TX",
            60 => "COMPILED_CLASS_HASH_MISMATCH",
            61 => "UNSUPPORTED_TX_VERSION",
            62 => "UNSUPPORTED_CONTRACT_CLASS_VERSION",
            63 => "UNEXPECTED_ERROR",
            _ => return None,
        };
        Some(name)
    }
}

impl std::fmt::Display for JsonRpcError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "JSON-RPC error {}: {}", self.code, self.message)?;
        if let Some(data) = &self.data {
            write!(f, " ({data})")?;
        }
        Ok(())
    }
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Box<RawValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: RpcId, result: Box<RawValue>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: RpcId, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// `true` when the response carries a result and no error.
    pub fn is_ok(&self) -> bool {
        self.error.is_none() && self.result.is_some()
    }

    /// The raw result text, or the node's error. A response with neither
    /// member yields JSON `null`.
    pub fn into_result(self) -> Result<Box<RawValue>, JsonRpcError> {
        if let Some(err) = self.error {
            Err(err)
        } else {
            Ok(self.result.unwrap_or_else(|| RawValue::NULL.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(1, "starknet_blockNumber", json!([]));
        let json = serde_json::to_string(&req).unwrap();
        assert!(json.contains("\"jsonrpc\":\"2.0\""));
        assert!(json.contains("\"method\":\"starknet_blockNumber\""));
        assert!(json.contains("\"id\":1"));
    }

    #[test]
    fn response_keeps_result_text() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":7,"result":{"type":"INVOKE","version":"0x1"}}"#,
        )
        .unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.id, RpcId::Number(7));
        let raw = resp.into_result().unwrap();
        assert_eq!(raw.get(), r#"{"type":"INVOKE","version":"0x1"}"#);
    }

    #[test]
    fn response_into_result_error() {
        let resp: JsonRpcResponse = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":"a","error":{"code":29,"message":"Transaction hash not found"}}"#,
        )
        .unwrap();
        assert!(!resp.is_ok());
        let err = resp.into_result().unwrap_err();
        assert_eq!(err.code, 29);
        assert_eq!(err.starknet_error(), Some("TXN_HASH_NOT_FOUND"));
    }

    #[test]
    fn empty_response_is_null() {
        let resp: JsonRpcResponse = serde_json::from_str(r#"{"jsonrpc":"2.0","id":null}"#).unwrap();
        assert_eq!(resp.id, RpcId::Null);
        assert_eq!(resp.into_result().unwrap().get(), "null");
    }

    #[test]
    fn error_display_includes_data() {
        let err = JsonRpcError {
            code: 63,
            message: "An unexpected error occurred".into(),
            data: Some(json!("Something crazy happened")),
        };
        assert_eq!(
            err.to_string(),
            "JSON-RPC error 63: An unexpected error occurred (\"Something crazy happened\")"
        );
        assert_eq!(err.starknet_error(), Some("UNEXPECTED_ERROR"));
        let unknown = JsonRpcError { code: -32601, message: "Method not found".into(), data: None };
        assert_eq!(unknown.starknet_error(), None);
    }
}
