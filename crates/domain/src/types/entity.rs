//! Entity and attribute wire types
//!
//! Entities are `{id, type, ...attributes}` objects. In the normalized
//! representation each attribute is `{value, type, metadata}`; with the
//! `keyValues` option the broker returns bare values instead, so attributes
//! are kept as raw JSON and decoded on demand.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{NgsiError, Result};

/// Entity as stored in the context broker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Entity {
    pub fn new(id: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self { id: id.into(), entity_type: entity_type.into(), attributes: Map::new() }
    }

    /// Entity carrying the given attribute set.
    pub fn with_attributes(
        id: impl Into<String>,
        entity_type: impl Into<String>,
        attributes: AttributeSet,
    ) -> Self {
        Self { id: id.into(), entity_type: entity_type.into(), attributes: attributes.into_inner() }
    }

    /// Normalized attribute record, if present and well-formed.
    pub fn attribute(&self, name: &str) -> Option<Attribute> {
        self.attributes.get(name).and_then(|raw| serde_json::from_value(raw.clone()).ok())
    }

    /// Raw attribute JSON (bare value under `keyValues`).
    pub fn raw_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub(crate) fn validate_identity(id: &str, entity_type: &str) -> Result<()> {
        if id.trim().is_empty() {
            return Err(NgsiError::Validation("entity id must not be empty".into()));
        }
        if entity_type.trim().is_empty() {
            return Err(NgsiError::Validation("entity type must not be empty".into()));
        }
        Ok(())
    }
}

/// Normalized attribute record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub value: Value,
    #[serde(rename = "type")]
    pub attr_type: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl Attribute {
    /// Attribute with an explicit type tag.
    pub fn new(value: impl Into<Value>, attr_type: impl Into<String>) -> Self {
        Self { value: value.into(), attr_type: attr_type.into(), metadata: Map::new() }
    }

    /// Attribute whose type tag is inferred from the value kind.
    pub fn inferred(value: impl Into<Value>) -> Self {
        let value = value.into();
        let attr_type = infer_attribute_type(&value).to_string();
        Self { value, attr_type, metadata: Map::new() }
    }

    #[must_use]
    pub fn with_metadata(mut self, name: impl Into<String>, metadata: Value) -> Self {
        self.metadata.insert(name.into(), metadata);
        self
    }

    fn into_value(self) -> Value {
        // Serializing a struct of JSON values and strings cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// NGSI type tag for a native JSON value.
///
/// Strings are `Text`, integers `Integer`, objects `StructuredValue`; any
/// other kind is its capitalized name.
pub fn infer_attribute_type(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "Text",
        Value::Number(n) if n.is_i64() || n.is_u64() => "Integer",
        Value::Number(_) => "Float",
        Value::Object(_) => "StructuredValue",
        Value::Bool(_) => "Bool",
        Value::Array(_) => "List",
        Value::Null => "None",
    }
}

/// Ordered set of attributes ready to be sent to the broker.
///
/// Built either from native values (type tags inferred) or from raw
/// pre-tagged records passed through unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeSet(Map<String, Value>);

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attributes already in wire form (`{"temp": {"value": 1, "type": "Number"}}`).
    pub fn from_raw(raw: Map<String, Value>) -> Self {
        Self(raw)
    }

    /// Attributes from native values; every tag is inferred.
    pub fn from_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut set = Self::new();
        for (name, value) in values {
            set.insert_value(name, value);
        }
        set
    }

    /// Insert a native value, inferring its type tag.
    pub fn insert_value(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.insert(name, Attribute::inferred(value))
    }

    pub fn insert(&mut self, name: impl Into<String>, attribute: Attribute) -> &mut Self {
        self.0.insert(name.into(), attribute.into_value());
        self
    }

    #[must_use]
    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert_value(name, value);
        self
    }

    #[must_use]
    pub fn with(mut self, name: impl Into<String>, attribute: Attribute) -> Self {
        self.insert(name, attribute);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }
}

/// Wire body for entity creation.
pub fn creation_body(id: &str, entity_type: &str, attributes: &AttributeSet) -> Result<Value> {
    Entity::validate_identity(id, entity_type)?;

    let mut body = Map::new();
    body.insert("id".into(), Value::String(id.to_string()));
    body.insert("type".into(), Value::String(entity_type.to_string()));
    for (name, attribute) in attributes.as_map() {
        if name == "id" || name == "type" {
            return Err(NgsiError::Validation(format!(
                "attribute name '{name}' is reserved"
            )));
        }
        body.insert(name.clone(), attribute.clone());
    }
    Ok(Value::Object(body))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn inference_table() {
        assert_eq!(infer_attribute_type(&json!("100l")), "Text");
        assert_eq!(infer_attribute_type(&json!(300)), "Integer");
        assert_eq!(infer_attribute_type(&json!(-3)), "Integer");
        assert_eq!(infer_attribute_type(&json!({"a": 1})), "StructuredValue");
        assert_eq!(infer_attribute_type(&json!(2.5)), "Float");
        assert_eq!(infer_attribute_type(&json!(true)), "Bool");
        assert_eq!(infer_attribute_type(&json!([1, 2])), "List");
        assert_eq!(infer_attribute_type(&Value::Null), "None");
    }

    #[test]
    fn creation_body_tags_inferred_attributes() {
        let attrs = AttributeSet::new().with_value("weight", 300).with_value("size", "100l");
        let body = creation_body("1", "fake", &attrs).unwrap();

        assert_eq!(
            body,
            json!({
                "id": "1",
                "type": "fake",
                "weight": {"value": 300, "type": "Integer"},
                "size": {"value": "100l", "type": "Text"}
            })
        );
    }

    #[test]
    fn raw_attributes_pass_through_untouched() {
        let raw = json!({"temp": {"value": 21.5, "type": "Number", "metadata": {}}});
        let attrs = AttributeSet::from_raw(raw.as_object().cloned().unwrap());
        let body = creation_body("room1", "Room", &attrs).unwrap();

        assert_eq!(body["temp"], json!({"value": 21.5, "type": "Number", "metadata": {}}));
    }

    #[test]
    fn creation_requires_identity() {
        let attrs = AttributeSet::new();
        assert!(creation_body("", "Room", &attrs).unwrap_err().is_validation());
        assert!(creation_body("room1", " ", &attrs).unwrap_err().is_validation());
    }

    #[test]
    fn reserved_attribute_names_rejected() {
        let attrs = AttributeSet::new().with_value("id", "other");
        assert!(creation_body("room1", "Room", &attrs).unwrap_err().is_validation());
    }

    #[test]
    fn entity_decodes_normalized_and_key_values() {
        let normalized: Entity = serde_json::from_value(json!({
            "id": "room1",
            "type": "Room",
            "temperature": {"value": 23, "type": "Integer", "metadata": {}}
        }))
        .unwrap();
        let attribute = normalized.attribute("temperature").unwrap();
        assert_eq!(attribute.value, json!(23));
        assert_eq!(attribute.attr_type, "Integer");

        let key_values: Entity =
            serde_json::from_value(json!({"id": "room1", "type": "Room", "temperature": 23}))
                .unwrap();
        assert_eq!(key_values.raw_attribute("temperature"), Some(&json!(23)));
        assert!(key_values.attribute("temperature").is_none());
    }

    #[test]
    fn metadata_is_serialized_only_when_present() {
        let plain = serde_json::to_value(Attribute::new(1, "Number")).unwrap();
        assert_eq!(plain, json!({"value": 1, "type": "Number"}));

        let with_meta = Attribute::inferred("x").with_metadata("unit", json!({"value": "C"}));
        let encoded = serde_json::to_value(with_meta).unwrap();
        assert_eq!(encoded["metadata"]["unit"], json!({"value": "C"}));
    }
}
