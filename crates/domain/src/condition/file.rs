//! File leaf configuration.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::operator::Operator;

/// Which document check a file leaf performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileSubType {
    FileExists,
    FileStatus,
    ContentContains,
    FrontmatterProperty,
}

/// How the target document is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TargetMode {
    /// The document active in the editor.
    #[default]
    CurrentFile,
    /// The document at `targetFilePath`.
    SpecificFile,
}

/// Editor state checks for [`FileSubType::FileStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileStatusCheck {
    IsOpen,
    IsActive,
}

/// One front-matter property comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyCheck {
    pub name: String,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default)]
    pub value: Value,
}

/// Typed payload of a `file` leaf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileConditionConfig {
    pub sub_type: FileSubType,
    #[serde(default)]
    pub target_mode: TargetMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_file_path: Option<String>,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_status_checks: Vec<FileStatusCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub properties: Vec<PropertyCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_value: Option<Value>,
}

impl FileConditionConfig {
    /// Property checks to run, preferring the `properties` list over the
    /// legacy single `propertyName`/`propertyValue` pair.
    #[must_use]
    pub fn property_checks(&self) -> Vec<PropertyCheck> {
        if !self.properties.is_empty() {
            return self.properties.clone();
        }
        match &self.property_name {
            Some(name) if !name.trim().is_empty() => vec![PropertyCheck {
                name: name.clone(),
                operator: self.operator,
                value: self.property_value.clone().unwrap_or(Value::Null),
            }],
            _ => Vec::new(),
        }
    }
}
