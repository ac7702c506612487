//! Token exchange
//!
//! Username and password are traded for a session token that every
//! management API request carries in the `cdn-auth-token` header.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{CdnError, Result};

/// Session token. `Debug` never prints the secret.
#[derive(Clone, PartialEq)]
pub struct AuthToken {
    token: String,
    lifetime: i64,
}

impl AuthToken {
    pub fn new(token: impl Into<String>, lifetime: i64) -> Self {
        Self {
            token: token.into(),
            lifetime,
        }
    }

    pub fn secret(&self) -> &str {
        &self.token
    }

    /// Lifetime in seconds as reported by the server
    pub fn lifetime(&self) -> i64 {
        self.lifetime
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthToken")
            .field("token", &"[REDACTED]")
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// Source of session tokens
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn obtain_token(&self, username: &str, password: &str) -> Result<AuthToken>;
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    status: u16,
    #[serde(default)]
    lifetime: i64,
    #[serde(default)]
    token: String,
}

/// Form-encoded token exchange against the OAuth endpoint
pub struct OAuthClient {
    client: Client,
    auth_url: String,
}

impl OAuthClient {
    pub fn new(auth_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cdnvideo-http/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            auth_url: auth_url.into(),
        })
    }
}

#[async_trait]
impl TokenProvider for OAuthClient {
    async fn obtain_token(&self, username: &str, password: &str) -> Result<AuthToken> {
        debug!("Requesting token from {}", self.auth_url);

        let response = self
            .client
            .post(&self.auth_url)
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CdnError::Auth {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: AuthResponse = serde_json::from_str(&body).map_err(|e| CdnError::Auth {
            status: status.as_u16(),
            message: format!("unreadable token response: {}", e),
        })?;

        if parsed.status != 200 {
            return Err(CdnError::Auth {
                status: parsed.status,
                message: format!("authentication failed with status: {}", parsed.status),
            });
        }
        if parsed.token.is_empty() {
            return Err(CdnError::Auth {
                status: parsed.status,
                message: "token missing from response".to_string(),
            });
        }

        info!("Obtained API token (lifetime {}s)", parsed.lifetime);
        Ok(AuthToken::new(parsed.token, parsed.lifetime))
    }
}
