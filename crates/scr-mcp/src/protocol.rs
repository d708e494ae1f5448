//! JSON-RPC 2.0 envelope and the MCP tool-result shape the simulator replies with.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Error codes the simulator emits. The first four are the reserved JSON-RPC
/// codes; `EvaluationFailed` is in the implementation-defined server range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    /// Degenerate reference population or unreadable reference data.
    EvaluationFailed,
}

impl ErrorCode {
    pub const fn code(self) -> i64 {
        match self {
            Self::ParseError => -32700,
            Self::InvalidRequest => -32600,
            Self::MethodNotFound => -32601,
            Self::InvalidParams => -32602,
            Self::EvaluationFailed => -32001,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl JsonRpcRequest {
    pub const fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code: code.code(),
                message: message.into(),
            }),
        }
    }

    /// A successful `tools/call` carrying a text summary and a structured payload.
    pub fn tool_output(id: Value, text: impl Into<String>, structured: Value) -> Self {
        Self::success(
            id,
            json!({
                "content": [{"type": "text", "text": text.into()}],
                "structuredContent": structured
            }),
        )
    }

    /// A `tools/call` the caller can recover from by re-prompting; flagged
    /// `isError` instead of failing the RPC.
    pub fn tool_error(id: Value, text: impl Into<String>, detail: Value) -> Self {
        Self::success(
            id,
            json!({
                "isError": true,
                "content": [{"type": "text", "text": text.into()}],
                "structuredContent": {"error": detail}
            }),
        )
    }

    pub fn with_id(mut self, id: Value) -> Self {
        self.id = id;
        self
    }

    pub fn error_code(&self) -> Option<i64> {
        self.error.as_ref().map(|e| e.code)
    }
}

#[derive(Debug, Deserialize)]
pub struct ToolsCallParams {
    pub name: String,
    pub arguments: Option<Value>,
}
