//! Client for the historical-data API
//!
//! Scenarios group recorded entity time series. Responses are passed
//! through as raw JSON; only time filters are formatted client side.

use std::time::Duration;

use ngsi_domain::{HistoryConfig, HistoryQuery, NgsiError, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use crate::http::response::{interpret, json_body};
use crate::http::{HttpClient, NotFound, Remote};

/// History API client rooted at `<host>/<prefix>`.
#[derive(Debug, Clone)]
pub struct HistoryClient {
    http: HttpClient,
    base_url: String,
}

impl HistoryClient {
    /// Client for `<url>/api`.
    ///
    /// # Errors
    /// Returns `NgsiError::Config` for a relative URL or when the HTTP
    /// client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        Self::from_config(&HistoryConfig::new(url))
    }

    /// # Errors
    /// Returns `NgsiError::Config` for a relative URL or when the HTTP
    /// client cannot be built.
    pub fn from_config(config: &HistoryConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Self::with_http_client(&config.url, &config.prefix, http)
    }

    /// # Errors
    /// Returns `NgsiError::Config` for a relative URL.
    pub fn with_http_client(url: &str, prefix: &str, http: HttpClient) -> Result<Self> {
        Url::parse(url)
            .map_err(|err| NgsiError::Config(format!("invalid history URL '{url}': {err}")))?;

        let host = url.trim_end_matches('/');
        let prefix = prefix.trim_matches('/');
        let base_url =
            if prefix.is_empty() { host.to_string() } else { format!("{host}/{prefix}") };
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn scenario_create(&self, scenario_id: &str) -> Result<()> {
        let path = format!("/scenario/{}", seg(scenario_id)?);
        self.call(Method::POST, &path, &[], None, NotFound::Error).await?;
        Ok(())
    }

    /// Open the scenario's notification socket.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn scenario_socket_connect(&self, scenario_id: &str) -> Result<()> {
        let path = format!("/scenario/{}/socket", seg(scenario_id)?);
        self.call(Method::POST, &path, &[], None, NotFound::Error).await?;
        Ok(())
    }

    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn scenario_delete(&self, scenario_id: &str) -> Result<()> {
        let path = format!("/scenario/{}", seg(scenario_id)?);
        self.call(Method::DELETE, &path, &[], None, NotFound::Error).await?;
        Ok(())
    }

    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn scenario_socket_close(&self, scenario_id: &str) -> Result<()> {
        let path = format!("/scenario/{}/socket", seg(scenario_id)?);
        self.call(Method::DELETE, &path, &[], None, NotFound::Error).await?;
        Ok(())
    }

    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn scenario_list(&self) -> Result<Value> {
        self.call_json(Method::GET, "/scenarios", &[], NotFound::Error)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Scenario description, `None` when the API answers 404.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for any other non-success status.
    #[instrument(skip(self))]
    pub async fn scenario_get(&self, scenario_id: &str) -> Result<Option<Value>> {
        let path = format!("/scenario/{}", seg(scenario_id)?);
        self.call_json(Method::GET, &path, &[], NotFound::Absent).await
    }

    /// Entities recorded in a scenario.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self, query))]
    pub async fn entity_list(&self, scenario_id: &str, query: &HistoryQuery) -> Result<Value> {
        let path = format!("/scenario/{}/entities", seg(scenario_id)?);
        self.call_json(Method::GET, &path, &query.params(), NotFound::Error)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Entities of one type recorded in a scenario.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self, query))]
    pub async fn entity_list_by_type(
        &self,
        scenario_id: &str,
        entity_type: &str,
        query: &HistoryQuery,
    ) -> Result<Value> {
        let path = format!("/scenario/{}/entities/{}", seg(scenario_id)?, seg(entity_type)?);
        self.call_json(Method::GET, &path, &query.params(), NotFound::Error)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Time series of one entity.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self, query))]
    pub async fn entity_get(
        &self,
        scenario_id: &str,
        entity_type: &str,
        entity_id: &str,
        query: &HistoryQuery,
    ) -> Result<Value> {
        let path = entity_path(scenario_id, entity_type, entity_id)?;
        self.call_json(Method::GET, &path, &query.params(), NotFound::Error)
            .await
            .map(Option::unwrap_or_default)
    }

    /// Earliest record time for an entity type (`min_time`).
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn entity_type_first_time(
        &self,
        scenario_id: &str,
        entity_type: &str,
    ) -> Result<Value> {
        self.entity_type_bound(scenario_id, entity_type, "min_time").await
    }

    /// Latest record time for an entity type (`max_time`).
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self))]
    pub async fn entity_type_last_time(
        &self,
        scenario_id: &str,
        entity_type: &str,
    ) -> Result<Value> {
        self.entity_type_bound(scenario_id, entity_type, "max_time").await
    }

    /// Store a new record for an entity.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self, record))]
    pub async fn entity_create(
        &self,
        scenario_id: &str,
        entity_type: &str,
        entity_id: &str,
        record: &Value,
    ) -> Result<()> {
        let path = entity_path(scenario_id, entity_type, entity_id)?;
        self.call(Method::POST, &path, &[], Some(record), NotFound::Error).await?;
        Ok(())
    }

    /// Update the stored record of an entity.
    ///
    /// # Errors
    /// Returns `NgsiError::History` for a non-success status.
    #[instrument(skip(self, record))]
    pub async fn entity_update(
        &self,
        scenario_id: &str,
        entity_type: &str,
        entity_id: &str,
        record: &Value,
    ) -> Result<()> {
        let path = entity_path(scenario_id, entity_type, entity_id)?;
        self.call(Method::PATCH, &path, &[], Some(record), NotFound::Error).await?;
        Ok(())
    }

    async fn entity_type_bound(
        &self,
        scenario_id: &str,
        entity_type: &str,
        bound: &str,
    ) -> Result<Value> {
        let path =
            format!("/scenario/{}/entities/{}/{bound}", seg(scenario_id)?, seg(entity_type)?);
        self.call_json(Method::GET, &path, &[], NotFound::Error)
            .await
            .map(Option::unwrap_or_default)
    }

    async fn call_json(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        not_found: NotFound,
    ) -> Result<Option<Value>> {
        match self.call(method, path, query, None, not_found).await? {
            Some(response) => json_body(response).await,
            None => Ok(None),
        }
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        not_found: NotFound,
    ) -> Result<Option<Response>> {
        let url = format!("{}{path}", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if body.is_some() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        debug!(%method, %url, ?query, ?body, "history request");

        let mut request = self.http.request(method, &url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            let payload = serde_json::to_string(body)
                .map_err(|err| NgsiError::Internal(format!("failed to serialize body: {err}")))?;
            request = request.body(payload);
        }

        let response = self.http.send(request).await?;
        interpret(Remote::History, response, not_found).await
    }
}

fn entity_path(scenario_id: &str, entity_type: &str, entity_id: &str) -> Result<String> {
    Ok(format!(
        "/scenario/{}/entity/{}/{}",
        seg(scenario_id)?,
        seg(entity_type)?,
        seg(entity_id)?
    ))
}

/// Encoded, non-empty path segment.
fn seg(value: &str) -> Result<String> {
    if value.trim().is_empty() {
        return Err(NgsiError::Validation("history path segment must not be empty".into()));
    }
    Ok(urlencoding::encode(value).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_joins_host_and_prefix() {
        let client = HistoryClient::new("http://history:8080/").unwrap();
        assert_eq!(client.base_url(), "http://history:8080/api");

        let custom = HistoryClient::with_http_client(
            "http://history:8080",
            "/v1/",
            HttpClient::new().unwrap(),
        )
        .unwrap();
        assert_eq!(custom.base_url(), "http://history:8080/v1");
    }

    #[test]
    fn entity_paths_are_encoded() {
        assert_eq!(
            entity_path("s1", "Room", "urn:Room 1").unwrap(),
            "/scenario/s1/entity/Room/urn%3ARoom%201"
        );
        assert!(entity_path("s1", "", "r1").unwrap_err().is_validation());
    }
}
