//! Domain types and models
//!
//! Wire representations for the NGSIv2 broker and the history API.

pub mod batch;
pub mod entity;
pub mod history;
pub mod query;
pub mod service_path;
pub mod subscription;

pub use batch::{BatchAction, BatchUpdate};
pub use entity::{creation_body, infer_attribute_type, Attribute, AttributeSet, Entity};
pub use history::{HistoryQuery, TimeBound};
pub use query::{EntityQuery, GeoFilter};
pub use service_path::ServicePath;
pub use subscription::{
    Condition, EntityMatcher, HttpEndpoint, Notification, Subject, Subscription,
    SubscriptionHandle, SubscriptionQuery, SubscriptionRequest, SubscriptionSet,
    SubscriptionUpdate,
};
