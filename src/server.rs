#![deny(warnings)]

// MCP server implementation

use crate::config::{GatewayConfig, SharingPolicy};
use crate::drive::{DriveApi, DriveClient};
use crate::error::Result;
use crate::tools::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;

/// The only protocol revision this gateway speaks
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "gdrive-mcp-server";

/// MCP server state
pub struct McpServer {
    /// Tool registry
    tool_registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a server around an already-built Drive client
    pub fn new(drive: Arc<dyn DriveApi>, sharing: SharingPolicy) -> Self {
        Self {
            tool_registry: Arc::new(ToolRegistry::new(drive, sharing)),
        }
    }

    /// Create a server talking to Google Drive with the configured credentials
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let drive = DriveClient::new(config.credentials.clone())?;
        Ok(Self::new(Arc::new(drive), config.sharing))
    }

    /// Handle initialize request
    pub fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
            "capabilities": {
                "tools": {},
            },
        })
    }

    /// Handle tool call, wrapping the tool's result as MCP text content
    pub async fn handle_tool_call(&self, tool_name: &str, arguments: &Value) -> Result<Value> {
        let result = self.tool_registry.execute_tool(tool_name, arguments).await?;
        let text = serde_json::to_string_pretty(&result)?;
        Ok(serde_json::json!({
            "content": [{
                "type": "text",
                "text": text,
            }]
        }))
    }

    /// List tools in MCP schema format
    pub fn list_tools(&self) -> Value {
        self.tool_registry.list_tools()
    }

    /// Policy applied to uploads
    pub fn sharing(&self) -> SharingPolicy {
        self.tool_registry.sharing()
    }
}
