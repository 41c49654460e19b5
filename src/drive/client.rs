#![deny(warnings)]

// Google Drive v3 REST client

use super::auth::TokenProvider;
use super::{DriveApi, DriveFile, ListRequest, NewFile, Permission};
use crate::config::Credentials;
use crate::error::{DriveError, Result};
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use std::time::Duration;

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

const UPLOAD_FIELDS: &str = "id, name, webViewLink";
const LIST_FIELDS: &str = "files(id, name, webViewLink, createdTime)";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

/// Authenticated Drive client shared by every request
pub struct DriveClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    api_base: String,
    upload_base: String,
}

impl DriveClient {
    /// Create a client against the public Google endpoints
    pub fn new(credentials: Credentials) -> Result<Self> {
        Self::with_timeouts(credentials, CONNECT_TIMEOUT, REQUEST_TIMEOUT)
    }

    /// Create a client whose requests (token refresh included) give up
    /// after `request_timeout`
    pub fn with_timeouts(
        credentials: Credentials,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(DriveError::Http)?;
        let tokens = TokenProvider::new(http.clone(), credentials);
        Ok(Self {
            http,
            tokens,
            api_base: DRIVE_API_BASE.to_string(),
            upload_base: DRIVE_UPLOAD_BASE.to_string(),
        })
    }

    /// Point the client at different roots (e.g. a local emulator),
    /// token endpoint included
    pub fn with_endpoints(mut self, api_base: &str, upload_base: &str, token_url: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self.upload_base = upload_base.trim_end_matches('/').to_string();
        self.tokens = self.tokens.with_url(token_url);
        self
    }

    /// Read the body of a response, turning non-2xx into `DriveError::Api`
    async fn read_body(resp: reqwest::Response) -> Result<String> {
        let status = resp.status();
        let body = resp.text().await.map_err(DriveError::Http)?;
        if !status.is_success() {
            return Err(DriveError::from_response_body(status.as_u16(), &body).into());
        }
        Ok(body)
    }
}

#[async_trait]
impl DriveApi for DriveClient {
    async fn create_file(&self, metadata: &NewFile, content: &str) -> Result<DriveFile> {
        let token = self.tokens.access_token().await?;
        let metadata_json = serde_json::to_string(metadata)?;
        let boundary = pick_boundary(content);
        let body = multipart_related_body(&boundary, &metadata_json, &metadata.mime_type, content);

        let resp = self
            .http
            .post(format!("{}/files", self.upload_base))
            .bearer_auth(token)
            .query(&[("uploadType", "multipart"), ("fields", UPLOAD_FIELDS)])
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(DriveError::Http)?;

        let body = Self::read_body(resp).await?;
        let file: DriveFile = serde_json::from_str(&body)
            .map_err(|e| DriveError::InvalidResponse(format!("files.create: {}", e)))?;
        tracing::debug!(file_id = %file.id, name = %file.name, "created Drive file");
        Ok(file)
    }

    async fn create_permission(&self, file_id: &str, permission: &Permission) -> Result<()> {
        let token = self.tokens.access_token().await?;
        let resp = self
            .http
            .post(format!("{}/files/{}/permissions", self.api_base, file_id))
            .bearer_auth(token)
            .json(permission)
            .send()
            .await
            .map_err(DriveError::Http)?;

        Self::read_body(resp).await?;
        tracing::debug!(file_id, role = %permission.role, grantee = %permission.grantee, "granted permission");
        Ok(())
    }

    async fn list_files(&self, request: &ListRequest) -> Result<Vec<DriveFile>> {
        let token = self.tokens.access_token().await?;

        let mut params: Vec<(&str, String)> = vec![
            ("fields", LIST_FIELDS.to_string()),
            ("pageSize", request.page_size.to_string()),
        ];
        if !request.query.is_empty() {
            params.push(("q", request.query.to_string()));
        }
        if let Some(order_by) = &request.order_by {
            params.push(("orderBy", order_by.clone()));
        }

        let resp = self
            .http
            .get(format!("{}/files", self.api_base))
            .bearer_auth(token)
            .query(&params)
            .send()
            .await
            .map_err(DriveError::Http)?;

        let body = Self::read_body(resp).await?;
        let list: FileList = serde_json::from_str(&body)
            .map_err(|e| DriveError::InvalidResponse(format!("files.list: {}", e)))?;
        Ok(list.files)
    }
}

/// Pick a multipart boundary that does not occur in the file body
fn pick_boundary(content: &str) -> String {
    let mut boundary = String::from("gdrive_mcp_boundary");
    let mut n = 0u32;
    while content.contains(&boundary) {
        n += 1;
        boundary = format!("gdrive_mcp_boundary_{}", n);
    }
    boundary
}

/// Body for `uploadType=multipart`: a JSON metadata part then the media part
fn multipart_related_body(boundary: &str, metadata_json: &str, mime_type: &str, content: &str) -> String {
    format!(
        "--{b}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{meta}\r\n\
         --{b}\r\nContent-Type: {mime}\r\n\r\n{content}\r\n\
         --{b}--\r\n",
        b = boundary,
        meta = metadata_json,
        mime = mime_type,
        content = content,
    )
}
