//! Service path (`Fiware-ServicePath`) scoping

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{HIERARCHICAL_SUFFIX, SERVICE_PATH_SEPARATOR};
use crate::errors::{NgsiError, Result};

/// Normalized, non-empty list of absolute service paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ServicePath(Vec<String>);

impl ServicePath {
    /// Parse a header-style value: one path or several separated by commas.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for empty input or relative paths.
    pub fn parse(value: &str) -> Result<Self> {
        Self::from_paths(value.split(','))
    }

    /// Build from individual path segments, trimming whitespace and trailing
    /// slashes.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for an empty list or relative paths.
    pub fn from_paths<I, S>(paths: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized = Vec::new();
        for path in paths {
            let trimmed = path.as_ref().trim();
            if trimmed.is_empty() {
                continue;
            }
            if !trimmed.starts_with('/') {
                return Err(NgsiError::Validation(format!(
                    "service path '{trimmed}' must start with '/'"
                )));
            }
            let without_slash = trimmed.trim_end_matches('/');
            normalized.push(if without_slash.is_empty() {
                "/".to_string()
            } else {
                without_slash.to_string()
            });
        }

        if normalized.is_empty() {
            return Err(NgsiError::Validation("service path must not be empty".into()));
        }
        Ok(Self(normalized))
    }

    pub fn paths(&self) -> &[String] {
        &self.0
    }

    /// Header value, paths joined with `", "`.
    pub fn header_value(&self) -> String {
        self.0.join(SERVICE_PATH_SEPARATOR)
    }

    /// Same scope extended to every descendant (`/a` becomes `/a/#`).
    #[must_use]
    pub fn hierarchical(&self) -> Self {
        let paths = self
            .0
            .iter()
            .map(|path| {
                if path.ends_with(HIERARCHICAL_SUFFIX) {
                    path.clone()
                } else if path == "/" {
                    HIERARCHICAL_SUFFIX.to_string()
                } else {
                    format!("{path}{HIERARCHICAL_SUFFIX}")
                }
            })
            .collect();
        Self(paths)
    }
}

impl fmt::Display for ServicePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.header_value())
    }
}

impl TryFrom<Vec<String>> for ServicePath {
    type Error = NgsiError;

    fn try_from(value: Vec<String>) -> Result<Self> {
        Self::from_paths(value)
    }
}

impl From<ServicePath> for Vec<String> {
    fn from(value: ServicePath) -> Self {
        value.0
    }
}
