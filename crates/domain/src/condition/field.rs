//! Field leaf configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operator::Operator;

/// Typed payload of a `field` leaf: compares a form field's current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldConditionConfig {
    /// Field id or label.
    #[serde(alias = "property", alias = "fieldLabel")]
    pub field_id: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}
