//! Token manager with lazy login and refresh
//!
//! Manages the OAuth token lifecycle for the password grant:
//! - First access performs a login
//! - Tokens within the safety margin of expiry are refreshed
//! - A failed refresh falls back to a fresh login
//!
//! The cached token set sits behind an async mutex that is held for the
//! whole login/refresh round-trip, so concurrent callers observing an
//! expired token wait for a single refresh instead of racing.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::client::OAuthClientError;
use super::traits::OAuthClientTrait;
use super::types::TokenSet;

/// Error type for token manager operations
#[derive(Debug)]
pub enum TokenManagerError {
    /// Login against the token endpoint failed
    LoginFailed(OAuthClientError),

    /// Explicit refresh failed
    RefreshFailed(OAuthClientError),

    /// No tokens available (not authenticated)
    NotAuthenticated,

    /// No refresh token available
    NoRefreshToken,
}

impl std::fmt::Display for TokenManagerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LoginFailed(e) => write!(f, "Login failed: {e}"),
            Self::RefreshFailed(e) => write!(f, "Token refresh failed: {e}"),
            Self::NotAuthenticated => write!(f, "Not authenticated (no tokens)"),
            Self::NoRefreshToken => write!(f, "No refresh token available"),
        }
    }
}

impl std::error::Error for TokenManagerError {}

/// Token manager with lazy acquisition and refresh
pub struct TokenManager<C: OAuthClientTrait + 'static> {
    oauth_client: Arc<C>,
    current_tokens: Mutex<Option<TokenSet>>,
    safety_margin_seconds: i64,
}

impl<C: OAuthClientTrait + 'static> std::fmt::Debug for TokenManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("safety_margin_seconds", &self.safety_margin_seconds)
            .finish_non_exhaustive()
    }
}

impl<C: OAuthClientTrait + 'static> TokenManager<C> {
    /// Create a token manager with an empty cache
    ///
    /// # Arguments
    /// * `oauth_client` - Client for the token endpoint
    /// * `safety_margin_seconds` - Treat tokens as expired this many seconds
    ///   before their actual expiry
    #[must_use]
    pub fn new(oauth_client: C, safety_margin_seconds: i64) -> Self {
        Self {
            oauth_client: Arc::new(oauth_client),
            current_tokens: Mutex::new(None),
            safety_margin_seconds,
        }
    }

    /// Create a token manager seeded with previously issued tokens
    #[must_use]
    pub fn with_tokens(oauth_client: C, tokens: TokenSet, safety_margin_seconds: i64) -> Self {
        Self {
            oauth_client: Arc::new(oauth_client),
            current_tokens: Mutex::new(Some(tokens)),
            safety_margin_seconds,
        }
    }

    /// Current token formatted for a request header
    ///
    /// Logs in on first use and refreshes stale tokens; see
    /// [`TokenSet::authorization_value`] for the formatting.
    ///
    /// # Errors
    /// Returns error if no valid token can be obtained
    pub async fn token(&self) -> Result<String, TokenManagerError> {
        Ok(self.valid_tokens().await?.authorization_value())
    }

    /// Current raw access token (with login/refresh as needed)
    ///
    /// # Errors
    /// Returns error if no valid token can be obtained
    pub async fn access_token(&self) -> Result<String, TokenManagerError> {
        Ok(self.valid_tokens().await?.access_token)
    }

    /// Perform a login regardless of the cached state
    ///
    /// # Errors
    /// Returns error if the token endpoint rejects the credentials
    pub async fn login(&self) -> Result<(), TokenManagerError> {
        let mut guard = self.current_tokens.lock().await;
        *guard = Some(self.do_login().await?);
        Ok(())
    }

    /// Refresh the cached tokens using the refresh token
    ///
    /// Unlike the lazy path in [`Self::token`], a failure here is returned
    /// and does not fall back to a login.
    ///
    /// # Errors
    /// Returns error if refresh fails or no refresh token available
    pub async fn refresh_tokens(&self) -> Result<(), TokenManagerError> {
        let mut guard = self.current_tokens.lock().await;
        let current = guard.as_ref().ok_or(TokenManagerError::NotAuthenticated)?;
        let refreshed = self.do_refresh(current).await?;
        *guard = Some(refreshed);
        Ok(())
    }

    /// Get current token set (without login or refresh)
    pub async fn get_tokens(&self) -> Option<TokenSet> {
        self.current_tokens.lock().await.clone()
    }

    /// Check if a token set is cached
    pub async fn is_authenticated(&self) -> bool {
        self.current_tokens.lock().await.is_some()
    }

    /// Drop the cached tokens; the next access logs in again
    pub async fn clear_tokens(&self) {
        *self.current_tokens.lock().await = None;
        info!("OAuth tokens cleared");
    }

    /// Get the safety margin in seconds
    #[must_use]
    pub fn safety_margin(&self) -> i64 {
        self.safety_margin_seconds
    }

    async fn valid_tokens(&self) -> Result<TokenSet, TokenManagerError> {
        let mut guard = self.current_tokens.lock().await;

        let next = match guard.as_ref() {
            None => {
                debug!("no cached OAuth token, logging in");
                Some(self.do_login().await?)
            }
            Some(current) if current.is_expired(self.safety_margin_seconds) => {
                match self.do_refresh(current).await {
                    Ok(refreshed) => Some(refreshed),
                    Err(err) => {
                        warn!(error = %err, "token refresh failed, falling back to login");
                        Some(self.do_login().await?)
                    }
                }
            }
            Some(_) => None,
        };

        if let Some(tokens) = next {
            *guard = Some(tokens);
        }

        guard.clone().ok_or(TokenManagerError::NotAuthenticated)
    }

    async fn do_login(&self) -> Result<TokenSet, TokenManagerError> {
        let tokens = self.oauth_client.login().await.map_err(TokenManagerError::LoginFailed)?;
        info!(expires_in = tokens.expires_in, "OAuth login successful");
        Ok(tokens)
    }

    async fn do_refresh(&self, current: &TokenSet) -> Result<TokenSet, TokenManagerError> {
        let refresh_token =
            current.refresh_token.clone().ok_or(TokenManagerError::NoRefreshToken)?;

        let mut refreshed = self
            .oauth_client
            .refresh_access_token(&refresh_token)
            .await
            .map_err(TokenManagerError::RefreshFailed)?;

        // Servers may omit the refresh token on refresh; keep the old one.
        if refreshed.refresh_token.is_none() {
            refreshed.refresh_token = Some(refresh_token);
        }

        info!(expires_in = refreshed.expires_in, "OAuth token refreshed");
        Ok(refreshed)
    }
}
