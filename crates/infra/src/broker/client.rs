//! Context broker client and request composer
//!
//! Builds every broker request: content negotiation, tenant and service
//! path scoping, token injection and JSON body serialization.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use ngsi_domain::constants::{HEADER_SERVICE, HEADER_SERVICE_PATH};
use ngsi_domain::{BrokerConfig, NgsiError, Result, ServicePath};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::auth::AccessTokenProvider;
use crate::http::HttpClient;

/// Client for the NGSIv2 API of a context broker.
///
/// Operations live in the `entities` and `subscriptions` modules.
#[derive(Clone)]
pub struct BrokerClient {
    http: HttpClient,
    base_url: String,
    service: Option<String>,
    service_path: Option<ServicePath>,
    token_header: HeaderName,
    auth: Option<Arc<dyn AccessTokenProvider>>,
}

impl fmt::Debug for BrokerClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrokerClient")
            .field("base_url", &self.base_url)
            .field("service", &self.service)
            .field("service_path", &self.service_path)
            .field("token_header", &self.token_header)
            .field("authenticated", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

impl BrokerClient {
    /// Client for the broker at `url` (a trailing `/` is ignored).
    ///
    /// # Errors
    /// Returns `NgsiError::Config` if the URL is not absolute or the HTTP
    /// client cannot be built.
    pub fn new(url: &str) -> Result<Self> {
        Self::with_http_client(url, HttpClient::new()?)
    }

    /// Client sharing an existing transport.
    ///
    /// # Errors
    /// Returns `NgsiError::Config` if the URL is not absolute.
    pub fn with_http_client(url: &str, http: HttpClient) -> Result<Self> {
        Ok(Self {
            http,
            base_url: normalize_base_url(url)?,
            service: None,
            service_path: None,
            token_header: HeaderName::from_static("authorization"),
            auth: None,
        })
    }

    /// Client configured from a [`BrokerConfig`] (no token provider).
    ///
    /// # Errors
    /// Returns `NgsiError::Config` for an invalid URL or token header and
    /// `NgsiError::Validation` for an invalid service path.
    pub fn from_config(config: &BrokerConfig) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        let mut client = Self::with_http_client(&config.url, http)?
            .with_token_header(&config.token_header)?;

        if let Some(service) = &config.service {
            client = client.with_service(service.clone());
        }
        if !config.service_path.is_empty() {
            client = client.with_service_path(ServicePath::from_paths(&config.service_path)?);
        }
        Ok(client)
    }

    /// Tenant sent as `Fiware-Service`.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = Some(service.into());
        self
    }

    /// Default scope sent as `Fiware-ServicePath`.
    #[must_use]
    pub fn with_service_path(mut self, service_path: ServicePath) -> Self {
        self.service_path = Some(service_path);
        self
    }

    /// Attach a token provider consulted before every request.
    #[must_use]
    pub fn with_token_provider(mut self, provider: Arc<dyn AccessTokenProvider>) -> Self {
        self.auth = Some(provider);
        self
    }

    /// Header that carries the token (`Authorization` by default).
    ///
    /// # Errors
    /// Returns `NgsiError::Config` if `name` is not a valid header name.
    pub fn with_token_header(mut self, name: &str) -> Result<Self> {
        self.token_header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|err| NgsiError::Config(format!("invalid token header '{name}': {err}")))?;
        Ok(self)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn service_path(&self) -> Option<&ServicePath> {
        self.service_path.as_ref()
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http
    }

    /// Absolute URL for a broker path such as `/v2/entities`.
    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Compose and send one request.
    ///
    /// `scope` overrides the configured service path for this call only.
    pub(crate) async fn execute(
        &self,
        method: Method,
        url: &str,
        query: &[(String, String)],
        body: Option<&Value>,
        scope: Option<&ServicePath>,
    ) -> Result<Response> {
        let headers = self.compose_headers(body.is_some(), scope).await?;
        let payload = body
            .map(serde_json::to_string)
            .transpose()
            .map_err(|err| NgsiError::Internal(format!("failed to serialize body: {err}")))?;

        debug!(
            %method,
            url,
            ?query,
            ?headers,
            body = payload.as_deref().unwrap_or_default(),
            "broker request"
        );

        let mut request = self.http.request(method, url).headers(headers);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(payload) = payload {
            request = request.body(payload);
        }

        self.http.send(request).await
    }

    async fn compose_headers(
        &self,
        has_body: bool,
        scope: Option<&ServicePath>,
    ) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if has_body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }

        if let Some(service) = &self.service {
            insert_header(&mut headers, HEADER_SERVICE, service)?;
        }

        if let Some(scope) = scope.or(self.service_path.as_ref()) {
            insert_header(&mut headers, HEADER_SERVICE_PATH, &scope.header_value())?;
        }

        if let Some(auth) = &self.auth {
            let token = auth.authorization().await?;
            let value = HeaderValue::from_str(&token)
                .map_err(|_| NgsiError::Auth("token is not a valid header value".into()))?;
            headers.insert(self.token_header.clone(), value);
        }

        Ok(headers)
    }
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let header_name = HeaderName::from_bytes(name.as_bytes())
        .map_err(|err| NgsiError::Internal(format!("invalid header name {name}: {err}")))?;
    let header_value = HeaderValue::from_str(value)
        .map_err(|_| NgsiError::Validation(format!("value for header {name} is not valid")))?;
    headers.insert(header_name, header_value);
    Ok(())
}

fn normalize_base_url(url: &str) -> Result<String> {
    let parsed = Url::parse(url)
        .map_err(|err| NgsiError::Config(format!("invalid broker URL '{url}': {err}")))?;
    if parsed.cannot_be_a_base() {
        return Err(NgsiError::Config(format!("broker URL '{url}' cannot be a base")));
    }
    Ok(url.trim_end_matches('/').to_string())
}

/// Percent-encode a value used as a single path segment.
pub(crate) fn segment(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}
