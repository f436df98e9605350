//! Configuration loader
//!
//! Loads connector configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `NGSI_BROKER_URL`: Context broker base URL (required)
//! - `NGSI_SERVICE`: Tenant sent as `Fiware-Service`
//! - `NGSI_SERVICE_PATH`: Comma separated service paths
//! - `NGSI_TOKEN_HEADER`: Header carrying the OAuth token
//! - `NGSI_TIMEOUT_SECS`: Request timeout in seconds
//! - `NGSI_OAUTH_URL`: Authorization server; enables OAuth when set, and then
//!   requires `NGSI_OAUTH_CLIENT_ID`, `NGSI_OAUTH_CLIENT_SECRET`,
//!   `NGSI_OAUTH_USERNAME` and `NGSI_OAUTH_PASSWORD`
//! - `NGSI_OAUTH_SCOPES`: Space or comma separated scopes
//! - `NGSI_OAUTH_SAFETY_MARGIN`: Seconds before expiry to refresh
//! - `NGSI_HISTORY_URL`: History API base URL; enables the history client
//! - `NGSI_HISTORY_PREFIX`: Path prefix of the history API
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./ngsi.json` or `./ngsi.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. Relative to executable location

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ngsi_domain::constants::{
    DEFAULT_HISTORY_PREFIX, DEFAULT_SAFETY_MARGIN_SECS, DEFAULT_TIMEOUT_SECS, DEFAULT_TOKEN_HEADER,
};
use ngsi_domain::{BrokerConfig, ClientConfig, HistoryConfig, NgsiError, OAuthSettings, Result};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `NgsiError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `NgsiError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<ClientConfig> {
    let broker = BrokerConfig {
        url: env_var("NGSI_BROKER_URL")?,
        service: optional_env("NGSI_SERVICE"),
        service_path: optional_env("NGSI_SERVICE_PATH")
            .map(|paths| split_list(&paths, &[',']))
            .unwrap_or_default(),
        token_header: optional_env("NGSI_TOKEN_HEADER")
            .unwrap_or_else(|| DEFAULT_TOKEN_HEADER.to_string()),
        timeout_seconds: env_parse("NGSI_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
    };

    let oauth = match optional_env("NGSI_OAUTH_URL") {
        Some(url) => Some(OAuthSettings {
            url,
            client_id: env_var("NGSI_OAUTH_CLIENT_ID")?,
            client_secret: env_var("NGSI_OAUTH_CLIENT_SECRET")?,
            username: env_var("NGSI_OAUTH_USERNAME")?,
            password: env_var("NGSI_OAUTH_PASSWORD")?,
            scopes: optional_env("NGSI_OAUTH_SCOPES")
                .map(|scopes| split_list(&scopes, &[',', ' ']))
                .unwrap_or_default(),
            safety_margin_seconds: env_parse(
                "NGSI_OAUTH_SAFETY_MARGIN",
                DEFAULT_SAFETY_MARGIN_SECS,
            )?,
        }),
        None => None,
    };

    let history = optional_env("NGSI_HISTORY_URL").map(|url| HistoryConfig {
        url,
        prefix: optional_env("NGSI_HISTORY_PREFIX")
            .unwrap_or_else(|| DEFAULT_HISTORY_PREFIX.to_string()),
        timeout_seconds: broker.timeout_seconds,
    });

    Ok(ClientConfig { broker, oauth, history })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `NgsiError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(NgsiError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            NgsiError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| NgsiError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| NgsiError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| NgsiError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(NgsiError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    const NAMES: [&str; 4] = ["config.json", "config.toml", "ngsi.json", "ngsi.toml"];

    let mut roots = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `NgsiError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| NgsiError::Config(format!("Missing required environment variable: {}", key)))
}

/// Optional environment variable; blank values count as unset.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Parse an optional numeric environment variable.
fn env_parse<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match optional_env(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| NgsiError::Config(format!("Invalid value for {}: {}", key, e))),
        None => Ok(default),
    }
}

fn split_list(raw: &str, separators: &[char]) -> Vec<String> {
    raw.split(separators)
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
