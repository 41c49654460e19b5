#![deny(warnings)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request, Response, StatusCode};
use axum::Router;
use futures_util::StreamExt;
use gdrive_mcp::config::SharingPolicy;
use gdrive_mcp::drive::{DriveApi, DriveFile, ListRequest, NewFile, Permission};
use gdrive_mcp::error::{DriveError, Result};
use gdrive_mcp::server::McpServer;
use gdrive_mcp::transport::{router, AppState};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

/// In-memory Drive that records calls and can be told to fail
#[derive(Default)]
struct FakeDrive {
    files: Mutex<Vec<DriveFile>>,
    grants: Mutex<Vec<(String, Permission)>>,
    queries: Mutex<Vec<String>>,
    fail_with: Option<String>,
}

impl FakeDrive {
    fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    fn check(&self) -> Result<()> {
        match &self.fail_with {
            Some(message) => Err(DriveError::Api {
                status: 403,
                message: message.clone(),
            }
            .into()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DriveApi for FakeDrive {
    async fn create_file(&self, metadata: &NewFile, _content: &str) -> Result<DriveFile> {
        self.check()?;
        let mut files = self.files.lock().unwrap();
        let id = format!("id-{}", files.len() + 1);
        let file = DriveFile {
            id: id.clone(),
            name: metadata.name.clone(),
            web_view_link: Some(format!("https://drive.google.com/file/d/{}/view", id)),
            created_time: Some("2024-11-05T00:00:00.000Z".to_string()),
        };
        files.push(file.clone());
        Ok(file)
    }

    async fn create_permission(&self, file_id: &str, permission: &Permission) -> Result<()> {
        self.check()?;
        self.grants
            .lock()
            .unwrap()
            .push((file_id.to_string(), permission.clone()));
        Ok(())
    }

    async fn list_files(&self, request: &ListRequest) -> Result<Vec<DriveFile>> {
        self.check()?;
        self.queries.lock().unwrap().push(request.query.to_string());
        let files = self.files.lock().unwrap();
        Ok(files
            .iter()
            .take(request.page_size as usize)
            .cloned()
            .collect())
    }
}

struct Gateway {
    drive: Arc<FakeDrive>,
    state: AppState,
}

impl Gateway {
    fn new(drive: FakeDrive, sharing: SharingPolicy) -> Self {
        let drive = Arc::new(drive);
        let server = Arc::new(McpServer::new(drive.clone(), sharing));
        Self {
            drive,
            state: AppState::new(server),
        }
    }

    fn app(&self) -> Router {
        router(self.state.clone())
    }

    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app().oneshot(request).await.expect("router is infallible")
    }

    async fn rpc(&self, body: Value) -> Value {
        let resp = self
            .send(
                Request::post("/mcp")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["access-control-allow-origin"], "*");
        body_json(resp).await
    }

    async fn tool_call(&self, name: &str, arguments: Value) -> Value {
        self.rpc(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": {"name": name, "arguments": arguments}
        }))
        .await
    }
}

async fn body_json(resp: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// Parse the JSON text payload out of an MCP tool result
fn tool_payload(resp: &Value) -> Value {
    let text = resp["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("expected text content, got: {resp}"));
    serde_json::from_str(text).expect("tool text is JSON")
}

fn gateway() -> Gateway {
    Gateway::new(FakeDrive::default(), SharingPolicy::Public)
}

#[tokio::test]
async fn health_reports_ok_with_timestamp() {
    let gw = gateway();
    let resp = gw
        .send(Request::get("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body = body_json(resp).await;
    assert_eq!(body["status"], "ok");
    let ts = body["timestamp"].as_str().unwrap();
    assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok(), "bad timestamp {ts}");
}

#[tokio::test]
async fn preflight_advertises_methods_and_headers() {
    let gw = gateway();
    let resp = gw
        .send(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/mcp")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}

#[tokio::test]
async fn rest_tool_listing() {
    let gw = gateway();
    let resp = gw
        .send(Request::get("/mcp/tools").body(Body::empty()).unwrap())
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");

    let body = body_json(resp).await;
    let tools = body["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);
    assert_eq!(tools[0]["name"], "gdrive_upload");
    assert_eq!(tools[1]["name"], "gdrive_list");
}

#[tokio::test]
async fn initialize_returns_protocol_version() {
    let gw = gateway();
    let resp = gw
        .rpc(json!({"jsonrpc": "2.0", "id": 0, "method": "initialize", "params": {}}))
        .await;
    assert_eq!(resp["jsonrpc"], "2.0");
    assert_eq!(resp["id"], 0);
    assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
    assert_eq!(resp["result"]["serverInfo"]["name"], "gdrive-mcp-server");
    assert!(resp.get("error").is_none());
}

#[tokio::test]
async fn tools_list_is_identical_across_calls() {
    let gw = gateway();
    let before = gw.rpc(json!({"id": 1, "method": "tools/list"})).await;
    gw.tool_call("gdrive_upload", json!({"filename": "a.md", "content": "a"}))
        .await;
    let after = gw.rpc(json!({"id": 1, "method": "tools/list"})).await;
    assert_eq!(before, after);
    assert_eq!(before["result"]["tools"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn upload_returns_id_and_link_and_shares_publicly() {
    let gw = gateway();
    let resp = gw
        .tool_call(
            "gdrive_upload",
            json!({"filename": "prompt.md", "content": "# Prompt", "folderId": "folder-1"}),
        )
        .await;

    let payload = tool_payload(&resp);
    assert_eq!(payload["fileId"], "id-1");
    assert_eq!(payload["link"], "https://drive.google.com/file/d/id-1/view");

    let grants = gw.drive.grants.lock().unwrap();
    assert_eq!(grants.len(), 1);
    assert_eq!(grants[0].0, "id-1");
    assert_eq!(grants[0].1, Permission::public_reader());
}

#[tokio::test]
async fn upload_with_private_policy_does_not_share() {
    let gw = Gateway::new(FakeDrive::default(), SharingPolicy::Private);
    let resp = gw
        .tool_call("gdrive_upload", json!({"filename": "a.md", "content": "x"}))
        .await;
    assert_eq!(tool_payload(&resp)["fileId"], "id-1");
    assert!(gw.drive.grants.lock().unwrap().is_empty());
}

#[tokio::test]
async fn upload_missing_content_is_execution_error() {
    let gw = gateway();
    let resp = gw
        .tool_call("gdrive_upload", json!({"filename": "a.md"}))
        .await;
    assert_eq!(resp["error"]["code"], -32000);
    assert_eq!(resp["error"]["message"], "Missing required parameter: content");
    assert!(resp.get("result").is_none());
    assert!(gw.drive.files.lock().unwrap().is_empty());
}

#[tokio::test]
async fn list_defaults_to_non_trashed_and_caps_results() {
    let gw = gateway();
    for i in 0..25 {
        gw.tool_call(
            "gdrive_upload",
            json!({"filename": format!("f{i}.md"), "content": "x"}),
        )
        .await;
    }

    let resp = gw.tool_call("gdrive_list", json!({})).await;
    let payload = tool_payload(&resp);
    assert_eq!(payload["files"].as_array().unwrap().len(), 20);
    assert_eq!(payload["files"][0]["webViewLink"], "https://drive.google.com/file/d/id-1/view");

    let queries = gw.drive.queries.lock().unwrap();
    assert_eq!(queries.as_slice(), ["trashed = false"]);
}

#[tokio::test]
async fn list_escapes_single_quotes() {
    let gw = gateway();
    gw.tool_call("gdrive_list", json!({"query": "don't", "folderId": "f1"}))
        .await;
    let queries = gw.drive.queries.lock().unwrap();
    assert_eq!(
        queries[0],
        r"trashed = false and 'f1' in parents and name contains 'don\'t'"
    );
}

#[tokio::test]
async fn unknown_tool_echoes_request_id() {
    let gw = gateway();
    let resp = gw
        .rpc(json!({
            "jsonrpc": "2.0",
            "id": "abc-123",
            "method": "tools/call",
            "params": {"name": "unknown_tool", "arguments": {}}
        }))
        .await;
    assert_eq!(resp["id"], "abc-123");
    assert_eq!(resp["error"]["code"], -32000);
    assert_eq!(resp["error"]["message"], "Unknown tool: unknown_tool");
}

#[tokio::test]
async fn drive_failure_is_surfaced_verbatim() {
    let gw = Gateway::new(
        FakeDrive::failing("The user does not have sufficient permissions"),
        SharingPolicy::Public,
    );
    let resp = gw.tool_call("gdrive_list", json!({"query": "x"})).await;
    assert_eq!(resp["error"]["code"], -32000);
    assert_eq!(
        resp["error"]["message"],
        "Drive API error (403): The user does not have sufficient permissions"
    );
}

#[tokio::test]
async fn unknown_method_is_method_not_found() {
    let gw = gateway();
    let resp = gw.rpc(json!({"id": 9, "method": "prompts/list"})).await;
    assert_eq!(resp["id"], 9);
    assert_eq!(resp["error"], json!({"code": -32601, "message": "Method not found"}));
}

#[tokio::test]
async fn malformed_body_is_rejected_by_framework() {
    let gw = gateway();
    let resp = gw
        .send(
            Request::post("/mcp")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await;
    assert!(resp.status().is_client_error());
}

#[tokio::test]
async fn event_stream_sends_ready_frame_and_closes_cleanly() {
    let gw = gateway();
    let resp = gw
        .send(Request::get("/mcp").body(Body::empty()).unwrap())
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.headers()[header::CONTENT_TYPE], "text/event-stream");
    assert_eq!(resp.headers()[header::CACHE_CONTROL], "no-cache");
    assert_eq!(resp.headers()["access-control-allow-origin"], "*");
    assert_eq!(gw.state.sessions().open_sessions(), 1);

    let mut body = resp.into_body().into_data_stream();
    let first = body.next().await.expect("ready frame").expect("frame bytes");
    let text = String::from_utf8(first.to_vec()).unwrap();
    let data = text
        .strip_prefix("data: ")
        .and_then(|s| s.strip_suffix("\n\n"))
        .unwrap_or_else(|| panic!("unexpected frame: {text:?}"));
    let message: Value = serde_json::from_str(data).unwrap();
    assert_eq!(message["method"], "initialized");
    assert_eq!(message["params"]["protocolVersion"], "2024-11-05");

    drop(body);
    assert_eq!(gw.state.sessions().open_sessions(), 0);
}
