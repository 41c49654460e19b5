#![deny(warnings)]

// HTTP transport: routes, CORS headers, and the listener loop

use crate::config::GatewayConfig;
use crate::error::Result;
use crate::events::{session_stream, SessionTracker, KEEP_ALIVE_INTERVAL};
use crate::rpc::{handle_request, RpcRequest, RpcResponse};
use crate::server::McpServer;
use axum::{
    extract::State,
    http::{
        header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN},
        HeaderValue, StatusCode,
    },
    response::{
        sse::{Event, Sse},
        IntoResponse, Json,
    },
    routing::get,
    Router,
};
use chrono::{SecondsFormat, Utc};
use futures_util::stream::{Stream, StreamExt};
use serde_json::Value;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    server: Arc<McpServer>,
    sessions: SessionTracker,
}

impl AppState {
    pub fn new(server: Arc<McpServer>) -> Self {
        Self {
            server,
            sessions: SessionTracker::new(),
        }
    }

    pub fn sessions(&self) -> &SessionTracker {
        &self.sessions
    }
}

/// Build the gateway's router
pub fn router(state: AppState) -> Router {
    let mcp = Router::new()
        .route(
            "/mcp",
            get(open_event_stream).post(rpc_endpoint).options(preflight),
        )
        .route("/mcp/tools", get(list_tools))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ));

    Router::new()
        .route("/health", get(health))
        .merge(mcp)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C
pub async fn serve(config: &GatewayConfig, server: Arc<McpServer>) -> Result<()> {
    let sharing = server.sharing();
    let app = router(AppState::new(server));

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %sharing, "GDrive MCP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn open_event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let frames = session_stream(&state.sessions, KEEP_ALIVE_INTERVAL);
    Sse::new(frames.map(|frame| Ok::<_, Infallible>(frame.into_event())))
}

async fn rpc_endpoint(
    State(state): State<AppState>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    Json(handle_request(&state.server, request).await)
}

async fn preflight() -> impl IntoResponse {
    (
        StatusCode::NO_CONTENT,
        [
            (ACCESS_CONTROL_ALLOW_METHODS, "GET, POST, OPTIONS"),
            (ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        ],
    )
}

async fn list_tools(State(state): State<AppState>) -> Json<Value> {
    Json(serde_json::json!({ "tools": state.server.list_tools() }))
}
