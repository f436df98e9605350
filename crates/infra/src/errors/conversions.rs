//! Conversions from external infrastructure errors into domain errors.

use ngsi_domain::NgsiError;
use reqwest::Error as HttpError;
use serde_json::Error as JsonError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub NgsiError);

impl From<InfraError> for NgsiError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<NgsiError> for InfraError {
    fn from(value: NgsiError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoNgsiError {
    fn into_ngsi(self) -> NgsiError;
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → NgsiError */
/* -------------------------------------------------------------------------- */

impl IntoNgsiError for HttpError {
    fn into_ngsi(self) -> NgsiError {
        if self.is_timeout() {
            return NgsiError::Network("HTTP request timed out".into());
        }

        #[cfg(not(target_arch = "wasm32"))]
        if self.is_connect() {
            return NgsiError::Network(format!("HTTP connection failure: {self}"));
        }

        if self.is_builder() {
            return NgsiError::Validation(format!("invalid HTTP request: {self}"));
        }

        if self.is_decode() {
            return NgsiError::Decode(self.to_string());
        }

        NgsiError::Network(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_ngsi())
    }
}

/* -------------------------------------------------------------------------- */
/* serde_json::Error → NgsiError */
/* -------------------------------------------------------------------------- */

impl IntoNgsiError for JsonError {
    fn into_ngsi(self) -> NgsiError {
        if self.line() == 0 {
            return NgsiError::Decode(self.to_string());
        }
        NgsiError::Decode(format!(
            "invalid JSON at line {} column {}: {}",
            self.line(),
            self.column(),
            self
        ))
    }
}

impl From<JsonError> for InfraError {
    fn from(value: JsonError) -> Self {
        InfraError(value.into_ngsi())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::Client;

    use super::*;

    #[tokio::test]
    async fn connection_refused_maps_to_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = Client::builder().no_proxy().build().unwrap();
        let error = client.get(format!("http://{addr}")).send().await.unwrap_err();

        let mapped: NgsiError = InfraError::from(error).into();
        match mapped {
            NgsiError::Network(msg) => assert!(msg.contains("connection")),
            other => panic!("expected network error, got {:?}", other),
        }
    }

    #[test]
    fn invalid_json_maps_to_decode_error() {
        let error = serde_json::from_str::<serde_json::Value>("{ not json").unwrap_err();
        let mapped: NgsiError = InfraError::from(error).into();
        match mapped {
            NgsiError::Decode(msg) => assert!(msg.contains("line 1")),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn domain_errors_round_trip_through_newtype() {
        let original = NgsiError::Validation("bad".into());
        let back: NgsiError = InfraError::from(original.clone()).into();
        assert_eq!(back, original);
    }
}
