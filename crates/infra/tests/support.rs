//! Shared helpers for broker and history integration tests.

use ngsi_infra::BrokerClient;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Install a test subscriber once so `RUST_LOG` works for failing tests.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Broker client pointed at the mock server.
pub fn broker(server: &MockServer) -> BrokerClient {
    BrokerClient::new(&server.uri()).expect("mock server URI is absolute")
}

/// `count` normalized `Room` entities numbered from `start`.
pub fn room_page(start: usize, count: usize) -> Value {
    Value::Array(
        (start..start + count)
            .map(|n| {
                json!({
                    "id": format!("urn:Room:{n}"),
                    "type": "Room",
                    "temperature": {"value": 20 + (n % 5), "type": "Integer", "metadata": {}}
                })
            })
            .collect(),
    )
}

/// Value of `name` on the single request the server received.
pub async fn received_header(server: &MockServer, name: &str) -> Option<String> {
    let requests = server.received_requests().await.unwrap_or_default();
    requests
        .last()?
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
