#![deny(warnings)]

// Error types for the gdrive-mcp crate

use thiserror::Error;

/// Main error type for the gdrive-mcp gateway.
///
/// Every variant is transparent: the message a caller sees in an RPC error
/// envelope is the underlying failure's own description.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Drive API and authentication errors
    #[error(transparent)]
    Drive(#[from] DriveError),

    /// MCP protocol and tool dispatch errors
    #[error(transparent)]
    Mcp(#[from] McpError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while talking to the Drive API or minting tokens
#[derive(Error, Debug)]
pub enum DriveError {
    /// Token exchange failed or credentials are missing
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Drive answered with a non-success status
    #[error("Drive API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Request never completed (DNS, TLS, connection reset, ...)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Drive answered 2xx but the body was not what we asked for
    #[error("Unexpected Drive response: {0}")]
    InvalidResponse(String),
}

/// MCP protocol errors
#[derive(Error, Debug)]
pub enum McpError {
    /// Tool not found
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),

    /// Invalid tool parameters
    #[error("Invalid tool parameters: {0}")]
    InvalidToolParameters(String),

    /// A required argument is absent or empty
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A credential was not provided via flag or environment
    #[error("Missing credential: {0} is not set")]
    MissingCredential(&'static str),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, GatewayError>;

impl DriveError {
    /// Build an API error from a Drive error body.
    ///
    /// Drive reports failures as `{"error": {"code": 404, "message": "..."}}`;
    /// anything else is surfaced as the raw body text.
    pub fn from_response_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message").or(Some(e)))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.trim().to_string());
        DriveError::Api { status, message }
    }
}
