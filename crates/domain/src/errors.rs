//! Error types used throughout the connector

use thiserror::Error;

/// Main error type for NGSI connector operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NgsiError {
    /// Non-success response from the context broker.
    #[error("Broker error {status}: {message}")]
    Broker { status: u16, message: String },

    /// Non-success response from the history API.
    #[error("History error {status}: {message}")]
    History { status: u16, message: String },

    /// Caller-supplied parameters were rejected before any request was sent.
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Network error: {0}")]
    Network(String),

    /// A nominally successful response could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl NgsiError {
    /// HTTP status carried by broker and history errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Broker { status, .. } | Self::History { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// `true` when the remote side answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// `true` for errors raised locally before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

/// Result type alias for connector operations
pub type Result<T> = std::result::Result<T, NgsiError>;
