//! Form schemas and flow results handed to the host for rendering.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Value type and constraints of a form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Integer { min: i64, max: i64 },
}

/// A single input of a form.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub required: bool,
    #[serde(flatten)]
    pub kind: FieldKind,
    pub default: Option<Value>,
    /// Pre-filled value, e.g. the previous input or the current option.
    pub suggested_value: Option<Value>,
}

impl Field {
    pub fn string(name: &str) -> Self {
        Field {
            name: name.to_string(),
            required: true,
            kind: FieldKind::String,
            default: None,
            suggested_value: None,
        }
    }

    pub fn integer(name: &str, min: i64, max: i64) -> Self {
        Field {
            name: name.to_string(),
            required: true,
            kind: FieldKind::Integer { min, max },
            default: None,
            suggested_value: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_suggested(mut self, value: impl Into<Value>) -> Self {
        self.suggested_value = Some(value.into());
        self
    }
}

/// Ordered list of fields making up a form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Form {
    pub fields: Vec<Field>,
}

impl Form {
    pub fn new(fields: Vec<Field>) -> Self {
        Form { fields }
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Error key shown for the form as a whole rather than a single field.
pub const BASE_ERROR: &str = "base";

/// What a flow step asks the host to do next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowResult {
    /// Show (or re-show) a form.
    Form {
        flow_id: Uuid,
        step_id: String,
        data_schema: Form,
        errors: BTreeMap<String, String>,
    },
    /// The flow finished and stored its data in the entry `entry_id`.
    CreateEntry {
        flow_id: Uuid,
        entry_id: Uuid,
        title: String,
        data: Value,
    },
    /// The flow ended without storing anything new.
    Abort { flow_id: Uuid, reason: String },
}

impl FlowResult {
    /// Errors of a `Form` result; empty for every other variant.
    pub fn errors(&self) -> BTreeMap<String, String> {
        match self {
            FlowResult::Form { errors, .. } => errors.clone(),
            _ => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_serialization() {
        let field = Field::integer("color_red", 1, 200).with_default(100);
        assert_eq!(
            serde_json::to_value(&field).unwrap(),
            json!({
                "name": "color_red",
                "required": true,
                "type": "integer",
                "min": 1,
                "max": 200,
                "default": 100,
            })
        );
    }

    #[test]
    fn test_abort_serialization() {
        let flow_id = Uuid::new_v4();
        let result = FlowResult::Abort {
            flow_id,
            reason: "already_configured".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["type"], "abort");
        assert_eq!(value["reason"], "already_configured");
        assert!(result.errors().is_empty());
    }
}
