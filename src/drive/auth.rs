#![deny(warnings)]

// Refresh-token exchange and access token caching

use crate::config::Credentials;
use crate::error::{DriveError, Result};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Google's OAuth token endpoint
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// Mints access tokens from the configured refresh token.
///
/// One token is cached and shared by every request; the mutex also keeps
/// concurrent requests from refreshing at the same time.
pub struct TokenProvider {
    http: reqwest::Client,
    credentials: Credentials,
    token_url: String,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenProvider {
    pub fn new(http: reqwest::Client, credentials: Credentials) -> Self {
        Self::with_token_url(http, credentials, GOOGLE_TOKEN_URL)
    }

    pub fn with_token_url(http: reqwest::Client, credentials: Credentials, token_url: &str) -> Self {
        Self {
            http,
            credentials,
            token_url: token_url.to_string(),
            cached: Mutex::new(None),
        }
    }

    /// Same provider, exchanging tokens at `token_url` instead.
    /// Any cached token is discarded.
    pub fn with_url(self, token_url: &str) -> Self {
        Self::with_token_url(self.http, self.credentials, token_url)
    }

    /// Current access token, refreshing it first if needed
    pub async fn access_token(&self) -> Result<String> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref().filter(|t| Instant::now() < t.refresh_at) {
            return Ok(token.access_token.clone());
        }

        let fresh = self.refresh().await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn refresh(&self) -> Result<CachedToken> {
        let (client_id, client_secret, refresh_token) = self.credentials.require()?;

        tracing::debug!("refreshing Drive access token");
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("refresh_token", refresh_token),
        ];
        let resp = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(DriveError::Http)?;

        let status = resp.status();
        let body = resp.text().await.map_err(DriveError::Http)?;
        if !status.is_success() {
            let detail = DriveError::from_response_body(status.as_u16(), &body);
            return Err(DriveError::Auth(format!("token refresh failed: {}", detail)).into());
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| DriveError::Auth(format!("malformed token response: {}", e)))?;
        Ok(CachedToken {
            access_token: token.access_token,
            refresh_at: refresh_deadline(Instant::now(), token.expires_in),
        })
    }
}

/// When a token issued at `now` with lifetime `expires_in` should be replaced
fn refresh_deadline(now: Instant, expires_in: Option<u64>) -> Instant {
    // Google tokens live for an hour when the response omits the lifetime
    let lifetime = Duration::from_secs(expires_in.unwrap_or(3600));
    now + lifetime.saturating_sub(EXPIRY_MARGIN)
}
