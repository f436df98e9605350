//! Subscription operations against `/v2/subscriptions`.
//!
//! A `scope` argument replaces the configured service path for one call.

use ngsi_domain::constants::SUBSCRIPTIONS_PATH;
use ngsi_domain::{
    NgsiError, Result, ServicePath, SubscriptionHandle, SubscriptionQuery, SubscriptionRequest,
    SubscriptionSet, SubscriptionUpdate,
};
use reqwest::Method;
use serde_json::Value;
use tracing::{info, instrument};

use super::client::{segment, BrokerClient};
use crate::http::response::{interpret, json_body, location};
use crate::http::{NotFound, Remote};

impl BrokerClient {
    /// Register a subscription and return its id and location.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` when the request violates the
    /// attrs/exceptAttrs or http/httpCustom exclusivity (no request is sent),
    /// `NgsiError::Broker` for a non-success status and `NgsiError::Decode`
    /// when the broker returns no usable `Location`.
    #[instrument(skip(self, request))]
    pub async fn subscribe(
        &self,
        request: SubscriptionRequest,
        scope: Option<&ServicePath>,
    ) -> Result<SubscriptionHandle> {
        let subscription = request.build()?;
        let body = serde_json::to_value(&subscription)
            .map_err(|err| NgsiError::Internal(format!("failed to encode subscription: {err}")))?;

        let url = self.url(SUBSCRIPTIONS_PATH);
        let response = self.execute(Method::POST, &url, &[], Some(&body), scope).await?;
        let response = interpret(Remote::Broker, response, NotFound::Error)
            .await?
            .ok_or_else(|| NgsiError::Internal("subscribe response unexpectedly absent".into()))?;

        let location = location(response.headers()).ok_or_else(|| {
            NgsiError::Decode("subscribe response carries no Location header".into())
        })?;
        let handle = SubscriptionHandle::from_location(&location)?;
        info!(id = %handle.id, "subscription created");
        Ok(handle)
    }

    /// Delete a subscription addressed either by `url` (as returned in a
    /// handle's location, relative to the broker or absolute) or by id.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` unless exactly one of `url` and
    /// `subscription_id` is given, `NgsiError::Broker` for a non-success
    /// status.
    #[instrument(skip(self))]
    pub async fn unsubscribe(
        &self,
        url: Option<&str>,
        subscription_id: Option<&str>,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        let target = match (url, subscription_id) {
            (Some(url), None) if url.starts_with("http://") || url.starts_with("https://") => {
                url.to_string()
            }
            (Some(url), None) => self.url(&format!("/{}", url.trim_start_matches('/'))),
            (None, Some(id)) => self.url(&format!("{SUBSCRIPTIONS_PATH}/{}", segment(id))),
            _ => {
                return Err(NgsiError::Validation(
                    "exactly one of url and subscription id must be given".into(),
                ))
            }
        };

        let response = self.execute(Method::DELETE, &target, &[], None, scope).await?;
        interpret(Remote::Broker, response, NotFound::Error).await?;
        info!(url = %target, "subscription deleted");
        Ok(())
    }

    /// List subscriptions, or fetch one when the query names an id.
    ///
    /// A listing with a single element comes back as
    /// [`SubscriptionSet::One`]. `query.service_path` replaces the configured
    /// scope for this call.
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for a non-success status.
    #[instrument(skip(self))]
    pub async fn subscriptions(&self, query: &SubscriptionQuery) -> Result<SubscriptionSet> {
        let path = match &query.subscription_id {
            Some(id) => format!("{SUBSCRIPTIONS_PATH}/{}", segment(id)),
            None => SUBSCRIPTIONS_PATH.to_string(),
        };

        let url = self.url(&path);
        let response = self
            .execute(Method::GET, &url, &query.params(), None, query.service_path.as_ref())
            .await?;
        let Some(response) = interpret(Remote::Broker, response, NotFound::Error).await? else {
            return Ok(SubscriptionSet::Many(Vec::new()));
        };

        match json_body::<Value>(response).await? {
            Some(value) => SubscriptionSet::from_json(value),
            None => Ok(SubscriptionSet::Many(Vec::new())),
        }
    }

    /// Patch the supplied fields of a subscription.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` when both members of an exclusive pair
    /// are supplied, `NgsiError::Broker` for a non-success status.
    #[instrument(skip(self, update))]
    pub async fn subscription_update(
        &self,
        subscription_id: &str,
        update: &SubscriptionUpdate,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        if subscription_id.trim().is_empty() {
            return Err(NgsiError::Validation("subscription id must not be empty".into()));
        }
        let body = update.build()?;

        let url = self.url(&format!("{SUBSCRIPTIONS_PATH}/{}", segment(subscription_id)));
        let response = self.execute(Method::PATCH, &url, &[], Some(&body), scope).await?;
        interpret(Remote::Broker, response, NotFound::Error).await?;
        Ok(())
    }
}
