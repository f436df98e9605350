//! Token injection seam between the broker client and OAuth
//!
//! The broker client asks an [`AccessTokenProvider`] for the header value
//! before every request. The OAuth token manager implements it; tests and
//! applications can plug in their own.

use async_trait::async_trait;
use ngsi_common::auth::{OAuthClientTrait, TokenManager};
use ngsi_domain::NgsiError;

/// Trait for providing access tokens
///
/// This trait allows dependency injection and testing with mock providers.
#[async_trait]
pub trait AccessTokenProvider: Send + Sync {
    /// Value for the token header (e.g. `Bearer <token>`).
    ///
    /// This method should handle token refresh if needed.
    async fn authorization(&self) -> Result<String, NgsiError>;
}

#[async_trait]
impl<C: OAuthClientTrait + 'static> AccessTokenProvider for TokenManager<C> {
    async fn authorization(&self) -> Result<String, NgsiError> {
        self.token().await.map_err(|err| NgsiError::Auth(err.to_string()))
    }
}
