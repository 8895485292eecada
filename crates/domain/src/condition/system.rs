//! System leaf configuration.

use serde::{Deserialize, Serialize};

use crate::operator::Operator;

/// Which host property a system leaf inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemSubType {
    /// Version of formgate itself.
    PluginVersion,
    /// Version of the host application.
    HostVersion,
    /// Coarse editor layout.
    WorkspaceLayout,
}

/// Editor layout, derived from the number of open document views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutType {
    Single,
    Split,
}

/// Typed payload of a `system` leaf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConditionConfig {
    pub sub_type: SystemSubType,
    #[serde(default)]
    pub operator: Operator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_type: Option<LayoutType>,
}
