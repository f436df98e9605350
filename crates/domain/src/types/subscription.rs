//! Subscription wire types and request builders
//!
//! A notification must name exactly one of `attrs` / `exceptAttrs` and
//! exactly one of `http` / `httpCustom`. `SubscriptionRequest::build`
//! enforces both pairs; `SubscriptionUpdate::build` only rejects pairs where
//! both members are supplied, since a partial update may omit them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{NgsiError, Result};
use crate::types::service_path::ServicePath;

/// Subscription as stored by the broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub subject: Subject,
    pub notification: Notification,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttling: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub entities: Vec<EntityMatcher>,
    #[serde(default, skip_serializing_if = "Condition::is_empty")]
    pub condition: Condition,
}

/// Entity selector: a concrete `id` or an `idPattern`, optionally typed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntityMatcher {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_pattern: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub entity_type: Option<String>,
}

impl EntityMatcher {
    pub fn id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()), ..Self::default() }
    }

    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self { id_pattern: Some(pattern.into()), ..Self::default() }
    }

    #[must_use]
    pub fn of_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expression: Option<Value>,
}

impl Condition {
    pub fn is_empty(&self) -> bool {
        self.attrs.is_none() && self.expression.is_none()
    }
}

/// Notification block. Server-maintained counters (`timesSent`,
/// `lastNotification`, ...) land in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub except_attrs: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<HttpEndpoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_custom: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attrs_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Vec<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpEndpoint {
    pub url: String,
}

/// Identifier and location returned by a successful subscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionHandle {
    pub id: String,
    pub location: String,
}

impl SubscriptionHandle {
    /// Handle from a `Location` header; the id is its trailing segment.
    ///
    /// # Errors
    /// Returns `NgsiError::Decode` when the location has no usable segment.
    pub fn from_location(location: &str) -> Result<Self> {
        let id = location
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                NgsiError::Decode(format!("location '{location}' carries no subscription id"))
            })?;
        Ok(Self { id: id.to_string(), location: location.to_string() })
    }
}

/// Result of a subscription listing.
///
/// A listing that yields exactly one record is unwrapped to `One`, as is a
/// lookup by id.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriptionSet {
    One(Box<Subscription>),
    Many(Vec<Subscription>),
}

impl SubscriptionSet {
    /// Decode a broker response (object or array).
    ///
    /// # Errors
    /// Returns `NgsiError::Decode` when the JSON is not a subscription or a
    /// list of them.
    pub fn from_json(value: Value) -> Result<Self> {
        let decode = |err: serde_json::Error| NgsiError::Decode(err.to_string());
        match value {
            Value::Array(items) => {
                let mut subscriptions = items
                    .into_iter()
                    .map(serde_json::from_value)
                    .collect::<std::result::Result<Vec<Subscription>, _>>()
                    .map_err(decode)?;
                if subscriptions.len() == 1 {
                    Ok(Self::One(Box::new(subscriptions.remove(0))))
                } else {
                    Ok(Self::Many(subscriptions))
                }
            }
            other => serde_json::from_value(other).map(|s| Self::One(Box::new(s))).map_err(decode),
        }
    }

    pub fn into_vec(self) -> Vec<Subscription> {
        match self {
            Self::One(subscription) => vec![*subscription],
            Self::Many(subscriptions) => subscriptions,
        }
    }

    /// The single subscription, if the set holds exactly one.
    pub fn single(self) -> Option<Subscription> {
        match self {
            Self::One(subscription) => Some(*subscription),
            Self::Many(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(subscriptions) => subscriptions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Paging for subscription listings.
///
/// A zero `limit` or `offset` is treated as unset; the broker rejects
/// `limit=0`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionQuery {
    pub subscription_id: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub count: bool,
    /// Per-call service path that replaces the configured one.
    pub service_path: Option<ServicePath>,
}

impl SubscriptionQuery {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { subscription_id: Some(id.into()), ..Self::default() }
    }

    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(limit) = self.limit.filter(|&limit| limit > 0) {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset.filter(|&offset| offset > 0) {
            params.push(("offset".to_string(), offset.to_string()));
        }
        if self.count {
            params.push(("options".to_string(), "count".to_string()));
        }
        params
    }
}

/// Builder for a new subscription.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionRequest {
    description: String,
    entities: Vec<EntityMatcher>,
    condition_attributes: Option<Vec<String>>,
    condition_expression: Option<Value>,
    notification_attrs: Option<Vec<String>>,
    notification_attrs_blacklist: Option<Vec<String>>,
    http: Option<String>,
    http_custom: Option<Value>,
    attrs_format: Option<String>,
    metadata: Option<Vec<String>>,
    expires: Option<String>,
    throttling: Option<u64>,
}

impl SubscriptionRequest {
    pub fn new(description: impl Into<String>, entities: Vec<EntityMatcher>) -> Self {
        Self { description: description.into(), entities, ..Self::default() }
    }

    #[must_use]
    pub fn condition_attributes(mut self, attrs: Vec<String>) -> Self {
        self.condition_attributes = Some(attrs);
        self
    }

    #[must_use]
    pub fn condition_expression(mut self, expression: Value) -> Self {
        self.condition_expression = Some(expression);
        self
    }

    /// Attributes to include in notifications (empty list means all).
    #[must_use]
    pub fn notification_attrs(mut self, attrs: Vec<String>) -> Self {
        self.notification_attrs = Some(attrs);
        self
    }

    /// Attributes to leave out of notifications.
    #[must_use]
    pub fn notification_attrs_blacklist(mut self, attrs: Vec<String>) -> Self {
        self.notification_attrs_blacklist = Some(attrs);
        self
    }

    #[must_use]
    pub fn http(mut self, url: impl Into<String>) -> Self {
        self.http = Some(url.into());
        self
    }

    #[must_use]
    pub fn http_custom(mut self, custom: Value) -> Self {
        self.http_custom = Some(custom);
        self
    }

    #[must_use]
    pub fn attrs_format(mut self, format: impl Into<String>) -> Self {
        self.attrs_format = Some(format.into());
        self
    }

    #[must_use]
    pub fn metadata(mut self, metadata: Vec<String>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    #[must_use]
    pub fn expires(mut self, expires: impl Into<String>) -> Self {
        self.expires = Some(expires.into());
        self
    }

    #[must_use]
    pub fn throttling(mut self, seconds: u64) -> Self {
        self.throttling = Some(seconds);
        self
    }

    /// Validate and assemble the subscription record.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` unless exactly one of
    /// attrs/blacklist and exactly one of http/http_custom is set, or when
    /// no entity matcher is given.
    pub fn build(self) -> Result<Subscription> {
        if self.entities.is_empty() {
            return Err(NgsiError::Validation(
                "a subscription needs at least one entity matcher".into(),
            ));
        }
        exactly_one(
            self.notification_attrs.is_some(),
            self.notification_attrs_blacklist.is_some(),
            "notification_attrs",
            "notification_attrs_blacklist",
        )?;
        exactly_one(self.http.is_some(), self.http_custom.is_some(), "http", "http_custom")?;

        Ok(Subscription {
            id: None,
            description: Some(self.description),
            subject: Subject {
                entities: self.entities,
                condition: Condition {
                    attrs: self.condition_attributes,
                    expression: self.condition_expression,
                },
            },
            notification: Notification {
                attrs: self.notification_attrs,
                except_attrs: self.notification_attrs_blacklist,
                http: self.http.map(|url| HttpEndpoint { url }),
                http_custom: self.http_custom,
                attrs_format: self.attrs_format,
                metadata: self.metadata,
                extra: Map::new(),
            },
            expires: self.expires,
            throttling: self.throttling,
            status: None,
        })
    }
}

/// Partial update of an existing subscription; unset fields are not sent.
#[derive(Debug, Clone, Default)]
pub struct SubscriptionUpdate {
    pub status: Option<String>,
    pub description: Option<String>,
    pub entities: Option<Vec<EntityMatcher>>,
    pub condition_attributes: Option<Vec<String>>,
    pub condition_expression: Option<Value>,
    pub notification_attrs: Option<Vec<String>>,
    pub notification_attrs_blacklist: Option<Vec<String>>,
    pub http: Option<String>,
    pub http_custom: Option<Value>,
    pub attrs_format: Option<String>,
    pub metadata: Option<Vec<String>>,
    pub expires: Option<String>,
    pub throttling: Option<u64>,
}

impl SubscriptionUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// JSON patch body containing only the supplied fields.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` when both members of an exclusive
    /// pair are supplied.
    pub fn build(&self) -> Result<Value> {
        at_most_one(
            self.notification_attrs.is_some(),
            self.notification_attrs_blacklist.is_some(),
            "notification_attrs",
            "notification_attrs_blacklist",
        )?;
        at_most_one(self.http.is_some(), self.http_custom.is_some(), "http", "http_custom")?;

        let mut body = Map::new();
        insert_opt(&mut body, "status", self.status.clone());
        insert_opt(&mut body, "description", self.description.clone());
        insert_opt(&mut body, "expires", self.expires.clone());
        insert_opt(&mut body, "throttling", self.throttling);

        let mut condition = Map::new();
        insert_opt(&mut condition, "attrs", self.condition_attributes.clone());
        insert_opt(&mut condition, "expression", self.condition_expression.clone());

        let mut subject = Map::new();
        insert_opt(&mut subject, "entities", self.entities.clone());
        if !condition.is_empty() {
            subject.insert("condition".into(), Value::Object(condition));
        }
        if !subject.is_empty() {
            body.insert("subject".into(), Value::Object(subject));
        }

        let mut notification = Map::new();
        insert_opt(&mut notification, "attrs", self.notification_attrs.clone());
        insert_opt(&mut notification, "exceptAttrs", self.notification_attrs_blacklist.clone());
        insert_opt(&mut notification, "http", self.http.clone().map(|url| HttpEndpoint { url }));
        insert_opt(&mut notification, "httpCustom", self.http_custom.clone());
        insert_opt(&mut notification, "attrsFormat", self.attrs_format.clone());
        insert_opt(&mut notification, "metadata", self.metadata.clone());
        if !notification.is_empty() {
            body.insert("notification".into(), Value::Object(notification));
        }

        Ok(Value::Object(body))
    }
}

fn exactly_one(first: bool, second: bool, first_name: &str, second_name: &str) -> Result<()> {
    if first == second {
        return Err(NgsiError::Validation(format!(
            "exactly one of {first_name} and {second_name} must be set"
        )));
    }
    Ok(())
}

fn at_most_one(first: bool, second: bool, first_name: &str, second_name: &str) -> Result<()> {
    if first && second {
        return Err(NgsiError::Validation(format!(
            "{first_name} and {second_name} are mutually exclusive"
        )));
    }
    Ok(())
}

fn insert_opt<T: Serialize>(target: &mut Map<String, Value>, key: &str, value: Option<T>) {
    if let Some(value) = value.and_then(|v| serde_json::to_value(v).ok()) {
        target.insert(key.to_string(), value);
    }
}
