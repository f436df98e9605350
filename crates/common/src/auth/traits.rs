//! Traits for OAuth operations
//!
//! Abstracts the token endpoint so the token manager can be driven by a mock
//! server or an in-memory fake.

use async_trait::async_trait;

use super::client::OAuthClientError;
use super::types::TokenSet;

/// Trait for OAuth token endpoint operations
#[async_trait]
pub trait OAuthClientTrait: Send + Sync {
    /// Obtain a fresh token set with the configured credentials
    ///
    /// # Errors
    /// Returns error if the request fails or the server rejects the grant
    async fn login(&self) -> Result<TokenSet, OAuthClientError>;

    /// Exchange a refresh token for a new token set
    ///
    /// # Errors
    /// Returns error if refresh fails or the token is invalid/revoked
    async fn refresh_access_token(&self, refresh_token: &str)
        -> Result<TokenSet, OAuthClientError>;
}
