//! NGSIv2 context broker client.
//!
//! - [`client`]: connection settings and request composition
//! - `entities`: entity CRUD, search, count and batch operations
//! - `subscriptions`: subscription CRUD

pub mod client;
mod entities;
mod subscriptions;

pub use client::BrokerClient;
