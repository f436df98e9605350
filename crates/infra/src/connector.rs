//! Connector facade
//!
//! Wires a [`ClientConfig`] into a broker client, an optional token manager
//! and an optional history client.

use std::sync::Arc;

use ngsi_common::auth::{PasswordGrantClient, PasswordGrantConfig, TokenManager};
use ngsi_domain::{ClientConfig, OAuthSettings, Result};
use tracing::info;

use crate::broker::BrokerClient;
use crate::history::HistoryClient;

/// Clients built from one configuration, sharing a token manager.
#[derive(Debug, Clone)]
pub struct Connector {
    broker: BrokerClient,
    history: Option<HistoryClient>,
    tokens: Option<Arc<TokenManager<PasswordGrantClient>>>,
}

impl Connector {
    /// # Errors
    /// Returns `NgsiError::Config` for an invalid URL or token header and
    /// `NgsiError::Validation` for an invalid service path.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let mut broker = BrokerClient::from_config(&config.broker)?;

        // Token requests go through the broker's HTTP client.
        let tokens = config.oauth.as_ref().map(|settings| {
            Arc::new(token_manager(settings, broker.http_client().inner().clone()))
        });
        if let Some(manager) = &tokens {
            broker = broker.with_token_provider(manager.clone());
        }

        let history = config.history.as_ref().map(HistoryClient::from_config).transpose()?;

        info!(
            broker = broker.base_url(),
            oauth = tokens.is_some(),
            history = history.is_some(),
            "connector ready"
        );
        Ok(Self { broker, history, tokens })
    }

    pub fn broker(&self) -> &BrokerClient {
        &self.broker
    }

    pub fn history(&self) -> Option<&HistoryClient> {
        self.history.as_ref()
    }

    /// Token manager shared with the broker client, when OAuth is configured.
    pub fn tokens(&self) -> Option<&Arc<TokenManager<PasswordGrantClient>>> {
        self.tokens.as_ref()
    }
}

fn token_manager(
    settings: &OAuthSettings,
    http: reqwest::Client,
) -> TokenManager<PasswordGrantClient> {
    let grant = PasswordGrantConfig::new(
        settings.url.clone(),
        settings.client_id.clone(),
        settings.client_secret.clone(),
        settings.username.clone(),
        settings.password.clone(),
    )
    .with_scopes(settings.scopes.clone());

    let client = PasswordGrantClient::with_http_client(grant, http);
    TokenManager::new(client, settings.safety_margin_seconds)
}
