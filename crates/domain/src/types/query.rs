//! Entity query parameters
//!
//! `EntityQuery` collects the filters shared by `search` and `count` and
//! renders them as NGSIv2 query parameters. Geo filters are validated when
//! the query is rendered, so an invalid combination never reaches the wire.

use crate::errors::{NgsiError, Result};
use crate::types::service_path::ServicePath;

const GEO_RELATIONS: [&str; 4] = ["coveredBy", "intersects", "equals", "disjoint"];
const GEO_SHAPES: [&str; 4] = ["point", "line", "polygon", "box"];

/// Validated geographical filter (`georel`, `geometry`, `coords`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFilter {
    georel: String,
    geometry: String,
    coords: String,
}

impl GeoFilter {
    /// # Errors
    /// Returns `NgsiError::Validation` if `georel` is not a known relation
    /// (or a `near` variant) or `geometry` is not a known shape.
    pub fn new(
        georel: impl Into<String>,
        geometry: impl Into<String>,
        coords: impl Into<String>,
    ) -> Result<Self> {
        let georel = georel.into();
        let geometry = geometry.into();
        let coords = coords.into();

        if !(georel.starts_with("near") || GEO_RELATIONS.contains(&georel.as_str())) {
            return Err(NgsiError::Validation(format!("unsupported georel '{georel}'")));
        }
        if !GEO_SHAPES.contains(&geometry.as_str()) {
            return Err(NgsiError::Validation(format!("unsupported geometry '{geometry}'")));
        }
        if coords.trim().is_empty() {
            return Err(NgsiError::Validation("coords must not be empty".into()));
        }
        Ok(Self { georel, geometry, coords })
    }

    /// All three parts must be given together or not at all.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for partial combinations or invalid
    /// values.
    pub fn from_parts(
        georel: Option<&str>,
        geometry: Option<&str>,
        coords: Option<&str>,
    ) -> Result<Option<Self>> {
        match (georel, geometry, coords) {
            (None, None, None) => Ok(None),
            (Some(georel), Some(geometry), Some(coords)) => {
                Self::new(georel, geometry, coords).map(Some)
            }
            _ => Err(NgsiError::Validation(
                "georel, geometry and coords must be provided together".into(),
            )),
        }
    }

    pub fn georel(&self) -> &str {
        &self.georel
    }

    pub fn geometry(&self) -> &str {
        &self.geometry
    }

    pub fn coords(&self) -> &str {
        &self.coords
    }
}

/// Filters for entity search and count.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityQuery {
    pub entity_type: Option<String>,
    pub id_pattern: Option<String>,
    pub q: Option<String>,
    pub georel: Option<String>,
    pub geometry: Option<String>,
    pub coords: Option<String>,
    /// Maximum number of entities; `0` means every match.
    pub limit: usize,
    pub offset: usize,
    pub key_values: bool,
    /// Extend the configured service path to all descendants.
    pub hierarchical: bool,
    /// Per-call service path that replaces the configured one.
    pub service_path: Option<ServicePath>,
}

impl EntityQuery {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entity_type(mut self, entity_type: impl Into<String>) -> Self {
        self.entity_type = Some(entity_type.into());
        self
    }

    #[must_use]
    pub fn id_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.id_pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn query(mut self, q: impl Into<String>) -> Self {
        self.q = Some(q.into());
        self
    }

    #[must_use]
    pub fn geo(
        mut self,
        georel: impl Into<String>,
        geometry: impl Into<String>,
        coords: impl Into<String>,
    ) -> Self {
        self.georel = Some(georel.into());
        self.geometry = Some(geometry.into());
        self.coords = Some(coords.into());
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn key_values(mut self, enabled: bool) -> Self {
        self.key_values = enabled;
        self
    }

    #[must_use]
    pub fn hierarchical(mut self, enabled: bool) -> Self {
        self.hierarchical = enabled;
        self
    }

    #[must_use]
    pub fn service_path(mut self, path: ServicePath) -> Self {
        self.service_path = Some(path);
        self
    }

    /// Validated geo filter, if any part of it was set.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for partial or invalid combinations.
    pub fn geo_filter(&self) -> Result<Option<GeoFilter>> {
        GeoFilter::from_parts(
            self.georel.as_deref(),
            self.geometry.as_deref(),
            self.coords.as_deref(),
        )
    }

    /// Filter parameters (`type`, `idPattern`, `q`, geo) without paging or
    /// options.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` for an invalid geo filter.
    pub fn filter_params(&self) -> Result<Vec<(String, String)>> {
        let mut params = Vec::new();
        if let Some(entity_type) = &self.entity_type {
            params.push(("type".to_string(), entity_type.clone()));
        }
        if let Some(pattern) = &self.id_pattern {
            params.push(("idPattern".to_string(), pattern.clone()));
        }
        if let Some(q) = &self.q {
            params.push(("q".to_string(), q.clone()));
        }
        if let Some(geo) = self.geo_filter()? {
            params.push(("georel".to_string(), geo.georel));
            params.push(("geometry".to_string(), geo.geometry));
            params.push(("coords".to_string(), geo.coords));
        }
        Ok(params)
    }

    /// Value of the `options` parameter (`count` always, `keyValues` on
    /// demand).
    pub fn options(&self) -> String {
        if self.key_values {
            "count,keyValues".to_string()
        } else {
            "count".to_string()
        }
    }

    /// Service path to send for this query.
    ///
    /// The per-call override wins over `configured`. With `hierarchical`
    /// set a scope is mandatory.
    ///
    /// # Errors
    /// Returns `NgsiError::Validation` when a hierarchical search has no
    /// scope to extend.
    pub fn effective_service_path(
        &self,
        configured: Option<&ServicePath>,
    ) -> Result<Option<ServicePath>> {
        let base = self.service_path.as_ref().or(configured);
        match (base, self.hierarchical) {
            (Some(path), true) => Ok(Some(path.hierarchical())),
            (None, true) => Err(NgsiError::Validation(
                "hierarchical search requires a configured service path".into(),
            )),
            (Some(path), false) if self.service_path.is_some() => Ok(Some(path.clone())),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn geo_filter_accepts_known_relations() {
        for georel in ["coveredBy", "intersects", "equals", "disjoint", "near;maxDistance:1000"] {
            assert!(GeoFilter::new(georel, "point", "1,2").is_ok(), "{georel}");
        }
        for geometry in ["point", "line", "polygon", "box"] {
            assert!(GeoFilter::new("intersects", geometry, "1,2").is_ok(), "{geometry}");
        }
    }

    #[test]
    fn geo_filter_rejects_unknown_values() {
        assert!(GeoFilter::new("within", "point", "1,2").unwrap_err().is_validation());
        assert!(GeoFilter::new("near", "circle", "1,2").unwrap_err().is_validation());
    }

    #[test]
    fn geo_filter_is_all_or_nothing() {
        assert_eq!(GeoFilter::from_parts(None, None, None).unwrap(), None);
        assert!(GeoFilter::from_parts(Some("near"), Some("point"), None).is_err());
        assert!(GeoFilter::from_parts(None, None, Some("1,2")).is_err());
    }

    #[test]
    fn filter_params_in_wire_order() {
        let query = EntityQuery::new()
            .entity_type("Room")
            .id_pattern("room.*")
            .query("temperature>20")
            .geo("near;maxDistance:5", "point", "40.4,-3.7");

        let params = query.filter_params().unwrap();
        let keys: Vec<&str> = params.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["type", "idPattern", "q", "georel", "geometry", "coords"]);
    }

    #[test]
    fn options_include_key_values_on_demand() {
        assert_eq!(EntityQuery::new().options(), "count");
        assert_eq!(EntityQuery::new().key_values(true).options(), "count,keyValues");
    }

    #[test]
    fn hierarchical_without_scope_is_rejected() {
        let query = EntityQuery::new().hierarchical(true);
        assert!(query.effective_service_path(None).unwrap_err().is_validation());
    }

    #[test]
    fn effective_service_path_rules() {
        let configured = ServicePath::parse("/a").unwrap();
        let override_path = ServicePath::parse("/b").unwrap();

        // Configured scope is left to the client defaults.
        assert_eq!(EntityQuery::new().effective_service_path(Some(&configured)).unwrap(), None);

        let hierarchical = EntityQuery::new().hierarchical(true);
        assert_eq!(
            hierarchical.effective_service_path(Some(&configured)).unwrap().unwrap().header_value(),
            "/a/#"
        );

        let overridden = EntityQuery::new().service_path(override_path.clone());
        assert_eq!(
            overridden.effective_service_path(Some(&configured)).unwrap(),
            Some(override_path)
        );
    }
}
