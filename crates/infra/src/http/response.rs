//! Response interpretation shared by the broker and history clients
//!
//! Maps status codes onto success, absence or a remote error and decodes
//! JSON bodies.

use ngsi_domain::constants::HEADER_TOTAL_COUNT;
use ngsi_domain::{NgsiError, Result};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::errors::InfraError;

/// Which remote API produced a response; selects the error variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remote {
    Broker,
    History,
}

impl Remote {
    fn error(self, status: u16, message: String) -> NgsiError {
        match self {
            Self::Broker => NgsiError::Broker { status, message },
            Self::History => NgsiError::History { status, message },
        }
    }
}

/// How a 404 answer is reported for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFound {
    /// 404 is an error like any other non-success status.
    Error,
    /// 404 means "nothing there": the caller receives `None`.
    Absent,
}

/// NGSI error document (`{"error": ..., "description": ...}`).
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    description: Option<String>,
}

/// Classify a response.
///
/// Returns the response on 2xx, `None` for a 404 under [`NotFound::Absent`]
/// and a remote error carrying status and message otherwise.
pub async fn interpret(
    remote: Remote,
    response: Response,
    not_found: NotFound,
) -> Result<Option<Response>> {
    let status = response.status();
    if status.is_success() {
        return Ok(Some(response));
    }

    if status == StatusCode::NOT_FOUND && not_found == NotFound::Absent {
        debug!(url = %response.url(), "resource not found, treating as absent");
        return Ok(None);
    }

    let body = response.text().await.unwrap_or_default();
    Err(remote.error(status.as_u16(), error_message(status, &body)))
}

/// Decode a JSON body; empty-body successes (204, 205 or zero length) yield
/// `None`.
pub async fn json_body<T: DeserializeOwned>(response: Response) -> Result<Option<T>> {
    let status = response.status();
    if status == StatusCode::NO_CONTENT || status == StatusCode::RESET_CONTENT {
        return Ok(None);
    }

    let bytes = response.bytes().await.map_err(|err| NgsiError::from(InfraError::from(err)))?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }

    serde_json::from_slice(&bytes).map(Some).map_err(|err| NgsiError::from(InfraError::from(err)))
}

/// Human readable message for an error response.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(document) = serde_json::from_str::<ErrorBody>(body) {
        return match document.description {
            Some(description) if !description.is_empty() => {
                format!("{}: {}", document.error, description)
            }
            _ => document.error,
        };
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        status.canonical_reason().unwrap_or("unknown status").to_string()
    } else {
        trimmed.to_string()
    }
}

/// Value of the `fiware-total-count` header, if present and numeric.
pub fn total_count(headers: &HeaderMap) -> Option<u64> {
    headers.get(HEADER_TOTAL_COUNT)?.to_str().ok()?.trim().parse().ok()
}

/// Value of the `Location` header.
pub fn location(headers: &HeaderMap) -> Option<String> {
    headers.get(LOCATION)?.to_str().ok().map(str::to_string)
}
