#![deny(warnings)]

// Drive adapter: the upstream operations the gateway needs, and their payloads

pub mod auth;
pub mod client;
pub mod query;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::DriveClient;
pub use query::{DriveQuery, Predicate};

/// MIME type every upload is stored with
pub const UPLOAD_MIME_TYPE: &str = "text/markdown";

/// Drive never returns more than this many files per list call here
pub const MAX_PAGE_SIZE: u32 = 20;

/// The subset of a Drive file resource surfaced to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriveFile {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_view_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

/// Metadata sent alongside the body of a new file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFile {
    pub name: String,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parents: Vec<String>,
}

impl NewFile {
    pub fn markdown(name: &str, folder_id: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            mime_type: UPLOAD_MIME_TYPE.to_string(),
            parents: folder_id.map(|f| vec![f.to_string()]).unwrap_or_default(),
        }
    }
}

/// A permission grant on a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Permission {
    pub role: String,
    #[serde(rename = "type")]
    pub grantee: String,
}

impl Permission {
    /// `reader` for `anyone`: link-readable by the public
    pub fn public_reader() -> Self {
        Self {
            role: "reader".to_string(),
            grantee: "anyone".to_string(),
        }
    }
}

/// Parameters of a single files.list call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest {
    pub query: DriveQuery,
    pub page_size: u32,
    pub order_by: Option<String>,
}

impl ListRequest {
    /// Newest first, first page only
    pub fn newest_first(query: DriveQuery) -> Self {
        Self {
            query,
            page_size: MAX_PAGE_SIZE,
            order_by: Some("createdTime desc".to_string()),
        }
    }
}

/// Upstream file storage operations.
///
/// `DriveClient` talks to Google Drive over HTTPS; tests inject fakes.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Create a file with `content` as its body
    async fn create_file(&self, metadata: &NewFile, content: &str) -> Result<DriveFile>;

    /// Add a permission grant to an existing file
    async fn create_permission(&self, file_id: &str, permission: &Permission) -> Result<()>;

    /// Return the first page of files matching `request`
    async fn list_files(&self, request: &ListRequest) -> Result<Vec<DriveFile>>;
}
