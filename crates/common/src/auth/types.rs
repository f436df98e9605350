//! OAuth 2.0 types and structures
//!
//! Token set, token endpoint responses and password-grant configuration.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OAuth 2.0 access and refresh tokens with metadata
#[derive(Clone, Serialize, Deserialize)]
pub struct TokenSet {
    /// Access token sent to the protected API
    pub access_token: String,

    /// Refresh token for obtaining new access tokens
    /// Optional because some servers don't issue refresh tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Token type as declared by the server (usually "Bearer")
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Absolute expiration timestamp (UTC)
    /// Calculated from expires_in when the token was received
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes (space-separated)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl TokenSet {
    /// Create a new `TokenSet` with calculated expiration time
    ///
    /// `expires_at` is `now + expires_in`; a non-positive lifetime leaves it
    /// unset.
    #[must_use]
    pub fn new(
        access_token: String,
        refresh_token: Option<String>,
        token_type: String,
        expires_in: i64,
        scope: Option<String>,
    ) -> Self {
        let expires_at = if expires_in > 0 {
            Some(Utc::now() + chrono::Duration::seconds(expires_in))
        } else {
            None
        };

        Self { access_token, refresh_token, token_type, expires_in, expires_at, scope }
    }

    /// Check if the access token is expired or will expire within the given
    /// margin
    ///
    /// Tokens without an expiry timestamp never expire.
    #[must_use]
    pub fn is_expired(&self, margin_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => {
                Utc::now() >= expires_at - chrono::Duration::seconds(margin_seconds)
            }
            None => false,
        }
    }

    /// Get seconds until token expiration
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|expires_at| (expires_at - Utc::now()).num_seconds())
    }

    /// `true` when the declared token type is "bearer" (any case).
    #[must_use]
    pub fn is_bearer(&self) -> bool {
        self.token_type.eq_ignore_ascii_case("bearer")
    }

    /// Header value for this token: `Bearer <token>` for bearer tokens, the
    /// raw token otherwise.
    #[must_use]
    pub fn authorization_value(&self) -> String {
        if self.is_bearer() {
            format!("Bearer {}", self.access_token)
        } else {
            self.access_token.clone()
        }
    }
}

impl fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSet")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("scope", &self.scope)
            .finish_non_exhaustive()
    }
}

/// Token endpoint response (RFC 6749 §5.1)
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self::new(
            response.access_token,
            response.refresh_token,
            response.token_type,
            response.expires_in,
            response.scope,
        )
    }
}

/// Resource-owner password grant configuration
#[derive(Clone)]
pub struct PasswordGrantConfig {
    /// Authorization server base URL (trailing `/` ignored)
    pub server_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
    /// OAuth scopes to request (sent space-separated)
    pub scopes: Vec<String>,
}

impl PasswordGrantConfig {
    #[must_use]
    pub fn new(
        server_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            scopes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    /// Token endpoint, `<server_url>/token`
    #[must_use]
    pub fn token_url(&self) -> String {
        format!("{}/token", self.server_url.trim_end_matches('/'))
    }

    /// Scopes as a space-separated string, `None` when no scope is set
    #[must_use]
    pub fn scope_string(&self) -> Option<String> {
        if self.scopes.is_empty() {
            None
        } else {
            Some(self.scopes.join(" "))
        }
    }
}

impl fmt::Debug for PasswordGrantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordGrantConfig")
            .field("server_url", &self.server_url)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// OAuth error response from authorization server (RFC 6749 §5.2)
#[derive(Debug, Deserialize)]
pub struct OAuthError {
    pub error: String,
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthError {}
