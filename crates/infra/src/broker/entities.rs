//! Entity operations
//!
//! CRUD, search and count against `/v2/entities`, plus batch updates.
//! Search accumulates pages until the requested number of entities is
//! reached or the broker runs out of results.
//!
//! Every operation accepts a per-call service path (`scope` argument or
//! `EntityQuery::service_path`) that replaces the configured one.

use ngsi_domain::constants::{BATCH_UPDATE_PATH, ENTITIES_PATH, MAX_PAGE_SIZE};
use ngsi_domain::{
    creation_body, AttributeSet, BatchAction, BatchUpdate, Entity, EntityQuery, NgsiError, Result,
    ServicePath,
};
use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, instrument};

use super::client::{segment, BrokerClient};
use crate::http::response::{interpret, json_body, total_count};
use crate::http::{NotFound, Remote};

impl BrokerClient {
    /// Fetch one entity by id.
    ///
    /// Returns `None` when the broker answers 404.
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for any other non-success status.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        id: &str,
        entity_type: Option<&str>,
        key_values: bool,
        scope: Option<&ServicePath>,
    ) -> Result<Option<Entity>> {
        require_id(id)?;
        let mut query = type_param(entity_type);
        if key_values {
            query.push(("options".to_string(), "keyValues".to_string()));
        }

        let url = self.url(&format!("{ENTITIES_PATH}/{}", segment(id)));
        let response = self.execute(Method::GET, &url, &query, None, scope).await?;
        let Some(response) = interpret(Remote::Broker, response, NotFound::Absent).await? else {
            return Ok(None);
        };
        json_body(response).await
    }

    /// Entities matching `query`, in broker order.
    ///
    /// A query limit of 0 fetches every match; pages are requested at most
    /// [`MAX_PAGE_SIZE`] entities at a time. A 404 yields an empty list.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for an invalid geo filter or a
    /// hierarchical search without a service path, before any request.
    #[instrument(skip(self, query))]
    pub async fn search(&self, query: &EntityQuery) -> Result<Vec<Entity>> {
        let filters = query.filter_params()?;
        let scope = query.effective_service_path(self.service_path())?;
        let cap = query.limit;
        let url = self.url(ENTITIES_PATH);

        let mut entities: Vec<Entity> = Vec::new();
        let mut offset = query.offset;

        loop {
            let page_limit = if cap == 0 {
                MAX_PAGE_SIZE
            } else {
                (cap - entities.len()).min(MAX_PAGE_SIZE)
            };

            let mut params = filters.clone();
            params.push(("options".to_string(), query.options()));
            params.push(("limit".to_string(), page_limit.to_string()));
            params.push(("offset".to_string(), offset.to_string()));

            let response =
                self.execute(Method::GET, &url, &params, None, scope.as_ref()).await?;
            let Some(response) = interpret(Remote::Broker, response, NotFound::Absent).await?
            else {
                break;
            };

            let total = total_count(response.headers());
            let page: Vec<Entity> = json_body(response).await?.unwrap_or_default();
            let received = page.len();
            offset += received;
            entities.extend(page);

            debug!(received, offset, ?total, "entity page");

            let more = received > 0
                && received == page_limit
                && (cap == 0 || entities.len() < cap)
                && total.is_some_and(|total| total > offset as u64);
            if !more {
                break;
            }
        }

        if cap > 0 {
            entities.truncate(cap);
        }
        Ok(entities)
    }

    /// Number of entities matching `query`'s filters.
    ///
    /// Paging fields of `query` are ignored. A 404 counts as zero.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` as [`Self::search`] does and
    /// `NgsiError::Decode` when the broker omits `fiware-total-count`.
    #[instrument(skip(self, query))]
    pub async fn count(&self, query: &EntityQuery) -> Result<u64> {
        let mut params = query.filter_params()?;
        let scope = query.effective_service_path(self.service_path())?;
        params.push(("options".to_string(), "count".to_string()));
        params.push(("limit".to_string(), "1".to_string()));

        let url = self.url(ENTITIES_PATH);
        let response = self.execute(Method::GET, &url, &params, None, scope.as_ref()).await?;
        let Some(response) = interpret(Remote::Broker, response, NotFound::Absent).await? else {
            return Ok(0);
        };

        total_count(response.headers()).ok_or_else(|| {
            NgsiError::Decode("broker response carries no fiware-total-count header".into())
        })
    }

    /// Create an entity.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for an empty id/type or a reserved
    /// attribute name, `NgsiError::Broker` for any non-success status.
    #[instrument(skip(self, attributes))]
    pub async fn create(
        &self,
        id: &str,
        entity_type: &str,
        attributes: &AttributeSet,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        let body = creation_body(id, entity_type, attributes)?;
        let url = self.url(ENTITIES_PATH);
        let response = self.execute(Method::POST, &url, &[], Some(&body), scope).await?;
        interpret(Remote::Broker, response, NotFound::Error).await?;
        info!(id, entity_type, "entity created");
        Ok(())
    }

    /// Update or append the given attributes (`PATCH .../attrs`).
    ///
    /// With `silent` a missing entity is not an error.
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for a non-success status.
    #[instrument(skip(self, attributes))]
    pub async fn patch(
        &self,
        id: &str,
        entity_type: Option<&str>,
        attributes: &AttributeSet,
        silent: bool,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        self.write_attributes(Method::PATCH, id, entity_type, attributes, silent, scope).await
    }

    /// Replace all attributes of an entity (`PUT .../attrs`).
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for a non-success status; a 404 is
    /// swallowed when `silent`.
    #[instrument(skip(self, attributes))]
    pub async fn update(
        &self,
        id: &str,
        entity_type: Option<&str>,
        attributes: &AttributeSet,
        silent: bool,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        self.write_attributes(Method::PUT, id, entity_type, attributes, silent, scope).await
    }

    /// Delete an entity. With `silent` a 404 is ignored.
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for a non-success status.
    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        id: &str,
        entity_type: Option<&str>,
        silent: bool,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        require_id(id)?;
        let url = self.url(&format!("{ENTITIES_PATH}/{}", segment(id)));
        let response =
            self.execute(Method::DELETE, &url, &type_param(entity_type), None, scope).await?;
        if interpret(Remote::Broker, response, not_found_policy(silent)).await?.is_some() {
            info!(id, "entity deleted");
        }
        Ok(())
    }

    /// Remove a single attribute from an entity.
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for a non-success status, 404 included.
    #[instrument(skip(self))]
    pub async fn delete_attribute(
        &self,
        id: &str,
        entity_type: Option<&str>,
        attribute: &str,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        require_id(id)?;
        if attribute.trim().is_empty() {
            return Err(NgsiError::Validation("attribute name must not be empty".into()));
        }

        let url = self.url(&format!(
            "{ENTITIES_PATH}/{}/attrs/{}",
            segment(id),
            segment(attribute)
        ));
        let response =
            self.execute(Method::DELETE, &url, &type_param(entity_type), None, scope).await?;
        interpret(Remote::Broker, response, NotFound::Error).await?;
        Ok(())
    }

    /// Apply `action` to several entities in one request (`/v2/op/update`).
    ///
    /// # Errors
    /// Returns `NgsiError::Broker` for a non-success status.
    #[instrument(skip(self, entities), fields(count = entities.len()))]
    pub async fn batch_update(
        &self,
        action: BatchAction,
        entities: Vec<Entity>,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        let body = serde_json::to_value(BatchUpdate::new(action, entities))
            .map_err(|err| NgsiError::Internal(format!("failed to encode batch: {err}")))?;
        let url = self.url(BATCH_UPDATE_PATH);
        let response = self.execute(Method::POST, &url, &[], Some(&body), scope).await?;
        interpret(Remote::Broker, response, NotFound::Error).await?;
        info!(action = action.as_str(), "batch update applied");
        Ok(())
    }

    async fn write_attributes(
        &self,
        method: Method,
        id: &str,
        entity_type: Option<&str>,
        attributes: &AttributeSet,
        silent: bool,
        scope: Option<&ServicePath>,
    ) -> Result<()> {
        require_id(id)?;
        let body = Value::Object(attributes.as_map().clone());
        let url = self.url(&format!("{ENTITIES_PATH}/{}/attrs", segment(id)));
        let response =
            self.execute(method, &url, &type_param(entity_type), Some(&body), scope).await?;
        interpret(Remote::Broker, response, not_found_policy(silent)).await?;
        Ok(())
    }
}

fn require_id(id: &str) -> Result<()> {
    if id.trim().is_empty() {
        return Err(NgsiError::Validation("entity id must not be empty".into()));
    }
    Ok(())
}

fn type_param(entity_type: Option<&str>) -> Vec<(String, String)> {
    entity_type.map(|t| vec![("type".to_string(), t.to_string())]).unwrap_or_default()
}

fn not_found_policy(silent: bool) -> NotFound {
    if silent {
        NotFound::Absent
    } else {
        NotFound::Error
    }
}
