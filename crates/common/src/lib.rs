//! Shared building blocks for the NGSI connector crates.
//!
//! Currently hosts the OAuth 2.0 password grant client and token manager
//! used to authenticate against protected brokers.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

pub mod auth;

pub use auth::{
    OAuthClientError, OAuthClientTrait, PasswordGrantClient, PasswordGrantConfig, TokenManager,
    TokenManagerError, TokenSet,
};
