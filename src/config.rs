#![deny(warnings)]

// Gateway configuration, built once at startup and handed to the server

use crate::error::ConfigError;
use std::fmt;

/// Default listen port when neither `--port` nor `PORT` is given
pub const DEFAULT_PORT: u16 = 10000;

/// OAuth client credentials used to mint Drive access tokens.
///
/// Fields are optional so the gateway can boot (and answer `/health`,
/// `initialize`, `tools/list`) without them; any Drive call then fails.
#[derive(Clone, Default)]
pub struct Credentials {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub refresh_token: Option<String>,
}

impl Credentials {
    pub fn new(
        client_id: Option<String>,
        client_secret: Option<String>,
        refresh_token: Option<String>,
    ) -> Self {
        // Treat empty env vars the same as unset ones
        let non_empty = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Self {
            client_id: non_empty(client_id),
            client_secret: non_empty(client_secret),
            refresh_token: non_empty(refresh_token),
        }
    }

    /// Names of the credentials that are not set
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.client_id.is_none() {
            missing.push("CLIENT_ID");
        }
        if self.client_secret.is_none() {
            missing.push("CLIENT_SECRET");
        }
        if self.refresh_token.is_none() {
            missing.push("REFRESH_TOKEN");
        }
        missing
    }

    /// Borrow all three values, or report the first missing one
    pub fn require(&self) -> Result<(&str, &str, &str), ConfigError> {
        let client_id = self
            .client_id
            .as_deref()
            .ok_or(ConfigError::MissingCredential("CLIENT_ID"))?;
        let client_secret = self
            .client_secret
            .as_deref()
            .ok_or(ConfigError::MissingCredential("CLIENT_SECRET"))?;
        let refresh_token = self
            .refresh_token
            .as_deref()
            .ok_or(ConfigError::MissingCredential("REFRESH_TOKEN"))?;
        Ok((client_id, client_secret, refresh_token))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |v: &Option<String>| if v.is_some() { "<redacted>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &redact(&self.client_secret))
            .field("refresh_token", &redact(&self.refresh_token))
            .finish()
    }
}

/// What happens to a file right after it is uploaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SharingPolicy {
    /// Grant `reader` to `anyone`, making the file link-readable
    #[default]
    Public,
    /// Leave the file's permissions untouched
    Private,
}

impl SharingPolicy {
    pub fn from_flag(share_publicly: bool) -> Self {
        if share_publicly {
            SharingPolicy::Public
        } else {
            SharingPolicy::Private
        }
    }
}

impl fmt::Display for SharingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharingPolicy::Public => write!(f, "public"),
            SharingPolicy::Private => write!(f, "private"),
        }
    }
}

/// Everything the gateway needs to run
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Credentials,
    pub sharing: SharingPolicy,
}

impl GatewayConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            credentials: Credentials::default(),
            sharing: SharingPolicy::default(),
        }
    }
}
