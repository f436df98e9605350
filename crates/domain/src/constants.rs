//! Protocol constants
//!
//! Centralized location for NGSIv2 paths, header names and limits shared by
//! the broker and history clients.

// NGSIv2 API
pub const ENTITIES_PATH: &str = "/v2/entities";
pub const SUBSCRIPTIONS_PATH: &str = "/v2/subscriptions";
pub const BATCH_UPDATE_PATH: &str = "/v2/op/update";

/// Largest page the broker serves for a single entity query.
pub const MAX_PAGE_SIZE: usize = 1000;

// Headers
pub const HEADER_SERVICE: &str = "Fiware-Service";
pub const HEADER_SERVICE_PATH: &str = "Fiware-ServicePath";
pub const HEADER_TOTAL_COUNT: &str = "fiware-total-count";
pub const DEFAULT_TOKEN_HEADER: &str = "Authorization";
pub const SERVICE_PATH_SEPARATOR: &str = ", ";
pub const HIERARCHICAL_SUFFIX: &str = "/#";

// OAuth
pub const DEFAULT_SAFETY_MARGIN_SECS: i64 = 10;

// History API
pub const DEFAULT_HISTORY_PREFIX: &str = "api";
/// `strftime` layout for history time filters (millisecond precision, UTC).
pub const HISTORY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// Transport
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
