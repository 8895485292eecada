//! Form: the durable configuration of an automatable unit of work.
//!
//! Forms live in `*.form.json` files. The condition engine only needs the
//! gate, the fields (for variable resolution) and the auto-trigger settings;
//! `actions` stay opaque and are handed to the action runner as-is.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::condition::{Condition, ConditionCategory};
use crate::error::{FormGateError, ValidationError};
use crate::filter::FieldFilter;

/// File name suffix identifying form configuration files.
pub const FORM_FILE_SUFFIX: &str = ".form.json";

/// Key under which the last fire time is persisted.
pub const LAST_EXECUTION_TIME_KEY: &str = "lastExecutionTime";

/// Whether a vault-relative path names a form configuration file.
#[must_use]
pub fn is_form_path(path: &str) -> bool {
    path.ends_with(FORM_FILE_SUFFIX)
}

/// Unattended firing settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoTriggerSettings {
    #[serde(default)]
    pub enabled: bool,
    /// Minimum seconds between two fires; the scheduler default applies when
    /// absent or shorter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooldown_seconds: Option<u64>,
}

/// One input of a form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormField {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_when: Option<FieldFilter>,
}

/// A form configuration as read from its file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startup_conditions: Option<Condition>,
    #[serde(default)]
    pub auto_trigger: AutoTriggerSettings,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_execution_time: Option<i64>,
}

impl FormConfig {
    /// Parse a form configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::MalformedForm`] when the text is not a valid
    /// form document.
    pub fn from_json(text: &str) -> Result<Self, FormGateError> {
        serde_json::from_str(text)
            .map_err(|err| ValidationError::MalformedForm(err.to_string()).into())
    }

    /// Whether the scheduler should monitor this form.
    ///
    /// Requires the auto-trigger flag and at least one enabled leaf tagged
    /// for the auto-trigger category.
    #[must_use]
    pub fn qualifies_for_auto_trigger(&self) -> bool {
        self.auto_trigger.enabled
            && self
                .startup_conditions
                .as_ref()
                .is_some_and(|tree| tree.has_enabled_leaf_tagged(ConditionCategory::AutoTrigger))
    }

    /// Find a field by label, then by id.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.fields
            .iter()
            .find(|f| f.label == key)
            .or_else(|| self.fields.iter().find(|f| f.id == key))
    }

    /// Current value of a field: the supplied value (keyed by id or label),
    /// else the field default.
    #[must_use]
    pub fn resolve_field_value(&self, key: &str, values: &Map<String, Value>) -> Option<Value> {
        let Some(field) = self.field(key) else {
            return values.get(key).cloned();
        };
        values
            .get(&field.id)
            .or_else(|| values.get(&field.label))
            .cloned()
            .or_else(|| field.default_value.clone())
    }
}
