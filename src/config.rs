//! Provider configuration
//!
//! Credentials and endpoints are passed explicitly into the transport and
//! controller constructors. The CLI fills them from flags or the `CDN_*`
//! environment variables.

use std::fmt;
use std::time::Duration;

use crate::error::{CdnError, Result};

pub const DEFAULT_API_URL: &str = "https://api.cdnvideo.ru";
pub const DEFAULT_AUTH_URL: &str = "https://api.cdnvideo.ru/app/oauth/v1/token/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub const ACCOUNT_NAME_ENV: &str = "CDN_ACCOUNT_NAME";
pub const USERNAME_ENV: &str = "CDN_USERNAME";
pub const PASSWORD_ENV: &str = "CDN_PASSWORD";

/// Everything needed to reach the management API
#[derive(Clone)]
pub struct ProviderConfig {
    pub account_name: String,
    pub username: String,
    pub password: String,
    pub api_url: String,
    pub auth_url: String,
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Config with default endpoints and timeout
    pub fn new(
        account_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            account_name: account_name.into(),
            username: username.into(),
            password: password.into(),
            api_url: DEFAULT_API_URL.to_string(),
            auth_url: DEFAULT_AUTH_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Reject missing credentials before any request is made
    pub fn validate(&self) -> Result<()> {
        for (field, value, env) in [
            ("account_name", &self.account_name, ACCOUNT_NAME_ENV),
            ("username", &self.username, USERNAME_ENV),
            ("password", &self.password, PASSWORD_ENV),
        ] {
            if value.trim().is_empty() {
                return Err(CdnError::Config {
                    field: field.to_string(),
                    message: format!("must be set (flag or {} environment variable)", env),
                });
            }
        }
        if self.api_url.trim().is_empty() {
            return Err(CdnError::Config {
                field: "api_url".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// URL of one resource, or of the collection when `id` is empty
    pub fn resource_url(&self, id: &str) -> String {
        format!(
            "{}/cdn/api/v1/{}/resource/http/{}",
            self.api_url.trim_end_matches('/'),
            urlencoding::encode(&self.account_name),
            urlencoding::encode(id)
        )
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("account_name", &self.account_name)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("api_url", &self.api_url)
            .field("auth_url", &self.auth_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}
