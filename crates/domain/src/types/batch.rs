//! Batch update (`/v2/op/update`) payloads

use serde::{Deserialize, Serialize};

use crate::types::entity::Entity;

/// Action applied to every entity of a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BatchAction {
    Append,
    AppendStrict,
    Update,
    Delete,
    Replace,
}

impl BatchAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Append => "append",
            Self::AppendStrict => "appendStrict",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Replace => "replace",
        }
    }
}

/// Body of a batch update request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchUpdate {
    pub action_type: BatchAction,
    pub entities: Vec<Entity>,
}

impl BatchUpdate {
    pub fn new(action_type: BatchAction, entities: Vec<Entity>) -> Self {
        Self { action_type, entities }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::types::entity::AttributeSet;

    #[test]
    fn serializes_action_and_entities_in_order() {
        let batch = BatchUpdate::new(
            BatchAction::AppendStrict,
            vec![
                Entity::with_attributes("r1", "Room", AttributeSet::new().with_value("t", 1)),
                Entity::new("r2", "Room"),
            ],
        );

        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({
                "actionType": "appendStrict",
                "entities": [
                    {"id": "r1", "type": "Room", "t": {"value": 1, "type": "Integer"}},
                    {"id": "r2", "type": "Room"}
                ]
            })
        );
    }

    #[test]
    fn action_names_match_wire_names() {
        for action in [
            BatchAction::Append,
            BatchAction::AppendStrict,
            BatchAction::Update,
            BatchAction::Delete,
            BatchAction::Replace,
        ] {
            assert_eq!(serde_json::to_value(action).unwrap(), json!(action.as_str()));
        }
    }
}
