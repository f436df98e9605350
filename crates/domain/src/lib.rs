//! # NGSI Domain
//!
//! Wire types and models for the NGSIv2 connector.
//!
//! This crate contains:
//! - Entity, attribute, subscription and batch payloads
//! - Query builders (entity filters, geo filters, history ranges)
//! - Service path normalization
//! - Error types and Result definitions
//! - Configuration structures and protocol constants
//!
//! ## Architecture
//! - No dependencies on other connector crates
//! - No I/O: every validation here runs before a request is built

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
