//! Management API transport
//!
//! Moves encoded documents to and from the resource endpoint. Status
//! interpretation beyond success/failure belongs to the controller.

use std::fmt;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::Client;
use tracing::debug;

use super::auth::{AuthToken, OAuthClient, TokenProvider};
use crate::config::ProviderConfig;
use crate::error::{CdnError, Result};

/// Header carrying the session token
pub const AUTH_HEADER: &str = "cdn-auth-token";

/// HTTP verbs used by the resource endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
        };
        f.write_str(verb)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
        }
    }
}

/// Request/response exchange with the resource endpoint.
///
/// `id` addresses one resource; an empty `id` addresses the collection.
/// Any non-2xx status is returned as [`CdnError::Transport`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, method: Method, id: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>>;
}

/// reqwest-backed transport bound to one account
pub struct HttpTransport {
    client: Client,
    config: ProviderConfig,
    token: AuthToken,
}

impl HttpTransport {
    /// Validate the config and exchange credentials for a token
    pub async fn connect(config: ProviderConfig) -> Result<Self> {
        let oauth = OAuthClient::new(config.auth_url.clone(), config.timeout)?;
        Self::connect_with(config, &oauth).await
    }

    /// Same as [`connect`](Self::connect) with a caller-supplied token source
    pub async fn connect_with(config: ProviderConfig, tokens: &dyn TokenProvider) -> Result<Self> {
        config.validate()?;
        let token = tokens.obtain_token(&config.username, &config.password).await?;
        Self::with_token(config, token)
    }

    pub fn with_token(config: ProviderConfig, token: AuthToken) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("cdnvideo-http/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            config,
            token,
        })
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(self.token.secret()).map_err(|_| CdnError::Auth {
            status: 0,
            message: "token contains characters not allowed in a header".to_string(),
        })?;
        headers.insert(AUTH_HEADER, token);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, method: Method, id: &str, body: Option<Vec<u8>>) -> Result<Vec<u8>> {
        let url = self.config.resource_url(id);
        debug!(%method, %url, body_bytes = body.as_ref().map_or(0, Vec::len), "Sending request");

        let mut request = self
            .client
            .request(method.into(), &url)
            .headers(self.headers()?);
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = bytes.len(), "Received response");

        if !status.is_success() {
            return Err(CdnError::Transport {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok(bytes.to_vec())
    }
}
