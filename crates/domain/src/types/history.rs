//! History API query types

use chrono::{DateTime, Utc};

use crate::constants::HISTORY_TIME_FORMAT;

/// Bound of a history time range: a raw token understood by the history
/// API (e.g. `now`) or an absolute instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeBound {
    Raw(String),
    At(DateTime<Utc>),
}

impl TimeBound {
    /// Wire form; instants use millisecond precision in UTC.
    pub fn to_query_value(&self) -> String {
        match self {
            Self::Raw(token) => token.clone(),
            Self::At(instant) => instant.format(HISTORY_TIME_FORMAT).to_string(),
        }
    }
}

impl From<DateTime<Utc>> for TimeBound {
    fn from(value: DateTime<Utc>) -> Self {
        Self::At(value)
    }
}

impl From<&str> for TimeBound {
    fn from(value: &str) -> Self {
        Self::Raw(value.to_string())
    }
}

impl From<String> for TimeBound {
    fn from(value: String) -> Self {
        Self::Raw(value)
    }
}

/// Filters for history entity queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub since: Option<TimeBound>,
    pub until: Option<TimeBound>,
    /// Restrict returned attributes (sent as a comma separated list).
    pub attributes: Vec<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

impl HistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn since(mut self, bound: impl Into<TimeBound>) -> Self {
        self.since = Some(bound.into());
        self
    }

    #[must_use]
    pub fn until(mut self, bound: impl Into<TimeBound>) -> Self {
        self.until = Some(bound.into());
        self
    }

    #[must_use]
    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Query parameters: `time>`, `time<`, `attributes`, `limit`, `offset`.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(since) = &self.since {
            params.push(("time>".to_string(), since.to_query_value()));
        }
        if let Some(until) = &self.until {
            params.push(("time<".to_string(), until.to_query_value()));
        }
        if !self.attributes.is_empty() {
            params.push(("attributes".to_string(), self.attributes.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset".to_string(), offset.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn instants_use_millisecond_utc_format() {
        let instant = Utc.with_ymd_and_hms(2019, 3, 7, 9, 5, 1).unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(TimeBound::At(instant).to_query_value(), "2019-03-07T09:05:01.042Z");
        assert_eq!(TimeBound::from("now").to_query_value(), "now");
    }

    #[test]
    fn params_pass_paging_through_unchanged() {
        let query = HistoryQuery::new()
            .since("1551949200000")
            .until("now")
            .attributes(["speed", "position"])
            .limit(50)
            .offset(100);

        assert_eq!(
            query.params(),
            vec![
                ("time>".to_string(), "1551949200000".to_string()),
                ("time<".to_string(), "now".to_string()),
                ("attributes".to_string(), "speed,position".to_string()),
                ("limit".to_string(), "50".to_string()),
                ("offset".to_string(), "100".to_string()),
            ]
        );
        assert!(HistoryQuery::new().params().is_empty());
    }
}
