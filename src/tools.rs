#![deny(warnings)]

// Tool registry and MCP tool definitions

use crate::config::SharingPolicy;
use crate::drive::{DriveApi, DriveQuery, ListRequest, NewFile, Permission};
use crate::error::{McpError, Result};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Tool registry that maps tool names onto Drive operations
pub struct ToolRegistry {
    drive: Arc<dyn DriveApi>,
    sharing: SharingPolicy,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new(drive: Arc<dyn DriveApi>, sharing: SharingPolicy) -> Self {
        Self { drive, sharing }
    }

    pub fn sharing(&self) -> SharingPolicy {
        self.sharing
    }

    /// Get all tools in MCP format
    pub fn list_tools(&self) -> Value {
        serde_json::json!([
            {
                "name": "gdrive_upload",
                "description": "Upload a markdown file to Google Drive",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "filename": {
                            "type": "string",
                            "description": "Filename (e.g., prompt.md)"
                        },
                        "content": {
                            "type": "string",
                            "description": "File content"
                        },
                        "folderId": {
                            "type": "string",
                            "description": "Optional folder ID"
                        }
                    },
                    "required": ["filename", "content"]
                }
            },
            {
                "name": "gdrive_list",
                "description": "List files in Google Drive",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search query"
                        },
                        "folderId": {
                            "type": "string",
                            "description": "Folder ID"
                        }
                    }
                }
            }
        ])
    }

    /// Execute a tool by name, returning the tool's own result object
    pub async fn execute_tool(&self, name: &str, arguments: &Value) -> Result<Value> {
        let args = arguments.as_object().ok_or_else(|| {
            McpError::InvalidToolParameters("Arguments must be an object".to_string())
        })?;

        match name {
            "gdrive_upload" => {
                let filename = required_str(args, "filename")?;
                let content = required_str(args, "content")?;
                let folder_id = optional_str(args, "folderId");
                self.upload(filename, content, folder_id).await
            }
            "gdrive_list" => {
                let query = optional_str(args, "query");
                let folder_id = optional_str(args, "folderId");
                self.list(query, folder_id).await
            }
            _ => Err(McpError::ToolNotFound(name.to_string()).into()),
        }
    }

    async fn upload(&self, filename: &str, content: &str, folder_id: Option<&str>) -> Result<Value> {
        let metadata = NewFile::markdown(filename, folder_id);
        let file = self.drive.create_file(&metadata, content).await?;

        if self.sharing == SharingPolicy::Public {
            self.drive
                .create_permission(&file.id, &Permission::public_reader())
                .await?;
        }

        Ok(serde_json::json!({
            "fileId": file.id,
            "link": file.web_view_link,
        }))
    }

    async fn list(&self, query: Option<&str>, folder_id: Option<&str>) -> Result<Value> {
        let request = ListRequest::newest_first(DriveQuery::for_listing(folder_id, query));
        let files = self.drive.list_files(&request).await?;
        Ok(serde_json::json!({ "files": files }))
    }
}

/// Fetch a required, non-empty string argument
fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| McpError::MissingParameter(key.to_string()).into())
}

/// Fetch an optional string argument; empty strings count as absent
fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}
