#![deny(warnings)]

// JSON-RPC envelopes and method dispatch for POST /mcp

use crate::error::McpError;
use crate::server::McpServer;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Method not found
pub const METHOD_NOT_FOUND: i32 = -32601;
/// Any failure while executing a tool
pub const EXECUTION_ERROR: i32 = -32000;

/// Inbound request. Every field is optional on the wire; a missing `id`
/// is echoed back as `null`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

/// Outbound envelope; exactly one of `result` / `error` is set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    pub fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Route one request to the server and build its response
pub async fn handle_request(server: &McpServer, request: RpcRequest) -> RpcResponse {
    let RpcRequest {
        method, params, id, ..
    } = request;

    match method.as_deref() {
        Some("initialize") => RpcResponse::ok(id, server.handle_initialize()),
        Some("tools/list") => RpcResponse::ok(id, serde_json::json!({ "tools": server.list_tools() })),
        Some("tools/call") => {
            let Some(name) = params.get("name").and_then(|n| n.as_str()) else {
                let e = McpError::MissingParameter("name".to_string());
                return RpcResponse::err(id, EXECUTION_ERROR, e.to_string());
            };
            let empty = Value::Object(Default::default());
            let arguments = match params.get("arguments") {
                Some(Value::Null) | None => &empty,
                Some(args) => args,
            };

            tracing::debug!(tool = name, "tools/call");
            match server.handle_tool_call(name, arguments).await {
                Ok(result) => RpcResponse::ok(id, result),
                Err(e) => {
                    tracing::warn!(tool = name, error = %e, "tool call failed");
                    RpcResponse::err(id, EXECUTION_ERROR, e.to_string())
                }
            }
        }
        other => {
            tracing::debug!(method = ?other, "method not found");
            RpcResponse::err(id, METHOD_NOT_FOUND, "Method not found")
        }
    }
}
