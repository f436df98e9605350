//! # NGSI Infrastructure
//!
//! HTTP clients for an NGSIv2 context broker and its history API.
//!
//! This crate contains:
//! - The context broker client (entities, subscriptions, batch updates)
//! - The history API client (scenarios, recorded entities)
//! - The shared transport and response interpretation
//! - Configuration loading from environment variables or files
//!
//! ## Architecture
//! - Wire types and validation come from `ngsi-domain`
//! - OAuth token handling comes from `ngsi-common`
//! - Contains all I/O; every request is a single attempt

pub mod auth;
pub mod broker;
pub mod config;
pub mod connector;
pub mod errors;
pub mod history;
pub mod http;

// Re-export commonly used items
pub use auth::AccessTokenProvider;
pub use broker::BrokerClient;
pub use connector::Connector;
pub use errors::InfraError;
pub use history::HistoryClient;
pub use http::{HttpClient, HttpClientBuilder};
