//! OAuth 2.0 password grant client
//!
//! Talks to the token endpoint of the authorization server:
//! - Resource-owner password login
//! - Token refresh
//!
//! Both requests authenticate the client with HTTP Basic credentials and
//! send a form-encoded body.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::traits::OAuthClientTrait;
use super::types::{OAuthError, PasswordGrantConfig, TokenResponse, TokenSet};

/// Error type for OAuth client operations
#[derive(Debug)]
pub enum OAuthClientError {
    /// HTTP request failed
    RequestFailed(reqwest::Error),

    /// OAuth server returned a standard error document
    OAuthError(OAuthError),

    /// Non-success status without a standard error document
    Rejected { status: u16, body: String },

    /// Failed to parse response
    ParseError(String),

    /// No refresh token available
    NoRefreshToken,
}

impl std::fmt::Display for OAuthClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RequestFailed(e) => write!(f, "HTTP request failed: {e}"),
            Self::OAuthError(e) => write!(f, "OAuth error: {e}"),
            Self::Rejected { status, body } => {
                write!(f, "Token endpoint returned status {status}: {body}")
            }
            Self::ParseError(msg) => write!(f, "Parse error: {msg}"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
        }
    }
}

impl std::error::Error for OAuthClientError {}

impl From<reqwest::Error> for OAuthClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::RequestFailed(err)
    }
}

/// OAuth 2.0 client for the resource-owner password grant
#[derive(Debug, Clone)]
pub struct PasswordGrantClient {
    config: PasswordGrantConfig,
    client: Client,
}

impl PasswordGrantClient {
    /// Create a client with its own connection pool and a 30 second timeout
    ///
    /// # Errors
    /// Returns `OAuthClientError::RequestFailed` if the HTTP client cannot be
    /// built (TLS backend initialization)
    pub fn new(config: PasswordGrantConfig) -> Result<Self, OAuthClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self::with_http_client(config, client))
    }

    /// Create a client sharing an existing connection pool
    #[must_use]
    pub fn with_http_client(config: PasswordGrantConfig, client: Client) -> Self {
        Self { config, client }
    }

    /// Request a token with the configured username and password
    ///
    /// # Errors
    /// Returns error if the request fails, the server rejects the
    /// credentials, or the response cannot be parsed
    pub async fn login(&self) -> Result<TokenSet, OAuthClientError> {
        let mut params = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("username".to_string(), self.config.username.clone()),
            ("password".to_string(), self.config.password.clone()),
        ];

        if let Some(scope) = self.config.scope_string() {
            params.push(("scope".to_string(), scope));
        }

        self.request_token(&params).await
    }

    /// Refresh access token using refresh token
    ///
    /// # Errors
    /// Returns error if:
    /// - No refresh token provided
    /// - Refresh fails
    /// - Token is invalid/revoked
    pub async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        if refresh_token.is_empty() {
            return Err(OAuthClientError::NoRefreshToken);
        }

        let params = vec![
            ("grant_type".to_string(), "refresh_token".to_string()),
            ("refresh_token".to_string(), refresh_token.to_string()),
        ];

        self.request_token(&params).await
    }

    /// Get a reference to the grant configuration
    #[must_use]
    pub fn config(&self) -> &PasswordGrantConfig {
        &self.config
    }

    async fn request_token(
        &self,
        params: &[(String, String)],
    ) -> Result<TokenSet, OAuthClientError> {
        let url = self.config.token_url();
        let grant_type = params.first().map_or("", |(_, value)| value.as_str());
        debug!(%url, grant_type, "requesting OAuth token");

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthError>(&body) {
                Ok(error) => OAuthClientError::OAuthError(error),
                Err(_) => OAuthClientError::Rejected { status: status.as_u16(), body },
            });
        }

        let token_response: TokenResponse =
            response.json().await.map_err(|e| OAuthClientError::ParseError(e.to_string()))?;

        debug!(%url, grant_type, expires_in = token_response.expires_in, "received OAuth token");
        Ok(token_response.into())
    }
}

#[async_trait]
impl OAuthClientTrait for PasswordGrantClient {
    async fn login(&self) -> Result<TokenSet, OAuthClientError> {
        self.login().await
    }

    async fn refresh_access_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenSet, OAuthClientError> {
        self.refresh_access_token(refresh_token).await
    }
}
