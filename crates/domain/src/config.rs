//! Configuration management

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_HISTORY_PREFIX, DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_HEADER,
};

/// Connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub broker: BrokerConfig,
    #[serde(default)]
    pub oauth: Option<OAuthSettings>,
    #[serde(default)]
    pub history: Option<HistoryConfig>,
}

/// Context broker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Base URL of the broker (e.g. `http://localhost:1026`)
    pub url: String,
    /// Tenant sent as `Fiware-Service`
    #[serde(default)]
    pub service: Option<String>,
    /// Service paths sent as `Fiware-ServicePath`
    #[serde(default)]
    pub service_path: Vec<String>,
    /// Header that carries the OAuth token
    #[serde(default = "default_token_header")]
    pub token_header: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,
}

/// OAuth2 resource-owner password grant settings
#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthSettings {
    /// Authorization server base URL; tokens are requested at `<url>/token`
    pub url: String,
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Seconds before expiry at which the token is considered stale
    #[serde(default = "default_safety_margin")]
    pub safety_margin_seconds: i64,
}

impl std::fmt::Debug for OAuthSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthSettings")
            .field("url", &self.url)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("scopes", &self.scopes)
            .field("safety_margin_seconds", &self.safety_margin_seconds)
            .finish_non_exhaustive()
    }
}

/// History API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub url: String,
    /// Path segment between host and resources (`api` by default)
    #[serde(default = "default_history_prefix")]
    pub prefix: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_seconds: u64,
}

impl BrokerConfig {
    /// Broker configuration with defaults for everything but the URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            service: None,
            service_path: Vec::new(),
            token_header: default_token_header(),
            timeout_seconds: default_timeout_secs(),
        }
    }
}

impl HistoryConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            prefix: default_history_prefix(),
            timeout_seconds: default_timeout_secs(),
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self { broker: BrokerConfig::new("http://localhost:1026"), oauth: None, history: None }
    }
}

fn default_token_header() -> String {
    DEFAULT_TOKEN_HEADER.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_safety_margin() -> i64 {
    DEFAULT_SAFETY_MARGIN_SECS
}

fn default_history_prefix() -> String {
    DEFAULT_HISTORY_PREFIX.to_string()
}
