//! OAuth 2.0 password grant support
//!
//! Obtains and keeps fresh the access token sent to a protected context
//! broker.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  TokenManager   │  Lazy login, refresh, login fallback
//! └────────┬────────┘
//!          │
//!          └──► OAuthClientTrait
//!                    │
//!                    └──► PasswordGrantClient  (token endpoint over HTTP)
//! ```
//!
//! # Usage Example
//!
//! ```no_run
//! use ngsi_common::auth::{PasswordGrantClient, PasswordGrantConfig, TokenManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PasswordGrantConfig::new(
//!         "http://keyrock:3000/oauth2",
//!         "client-id",
//!         "client-secret",
//!         "alice",
//!         "password",
//!     );
//!
//!     let manager = TokenManager::new(PasswordGrantClient::new(config)?, 10);
//!
//!     // Logs in on first use, refreshes once inside the safety margin
//!     let header_value = manager.token().await?;
//!     println!("Authorization: {header_value}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - **[`types`]**: Token set, token endpoint response, grant configuration
//! - **[`client`]**: HTTP client for the token endpoint
//! - **[`traits`]**: Token endpoint abstraction used by the manager
//! - **[`token_manager`]**: Token cache and refresh policy

pub mod client;
pub mod token_manager;
pub mod traits;
pub mod types;

pub use client::{OAuthClientError, PasswordGrantClient};
pub use token_manager::{TokenManager, TokenManagerError};
pub use traits::OAuthClientTrait;
pub use types::{OAuthError, PasswordGrantConfig, TokenResponse, TokenSet};
