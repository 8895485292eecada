//! Condition: a node in the execution gate attached to a form.
//!
//! A gate is a tree: [`ConditionKind::Group`] nodes combine their children
//! under a [`Relation`], every other kind is a leaf whose `config` payload
//! is parsed into the typed config of its kind when it is evaluated. Keeping
//! the payload raw means one malformed leaf fails on its own instead of
//! making the whole form unreadable.

mod field;
mod file;
mod script;
mod system;
mod time;

pub use field::FieldConditionConfig;
pub use file::{FileConditionConfig, FileStatusCheck, FileSubType, PropertyCheck, TargetMode};
pub use script::ScriptConditionConfig;
pub use system::{LayoutType, SystemConditionConfig, SystemSubType};
pub use time::{TimeConditionConfig, TimeSubType};

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Discriminator selecting the evaluation strategy for a node.
///
/// Unknown names are kept as [`ConditionKind::Custom`] so hosts can register
/// their own strategies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    Group,
    Field,
    Time,
    File,
    System,
    Script,
    Custom(String),
}

impl ConditionKind {
    /// Name used in configuration files.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Group => "group",
            Self::Field => "field",
            Self::Time => "time",
            Self::File => "file",
            Self::System => "system",
            Self::Script => "script",
            Self::Custom(name) => name,
        }
    }
}

impl From<String> for ConditionKind {
    fn from(value: String) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "group" => Self::Group,
            "field" => Self::Field,
            "time" => Self::Time,
            "file" => Self::File,
            "system" => Self::System,
            "script" => Self::Script,
            _ => Self::Custom(value),
        }
    }
}

impl From<ConditionKind> for String {
    fn from(value: ConditionKind) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a group combines its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    #[default]
    #[serde(alias = "AND")]
    And,
    #[serde(alias = "OR")]
    Or,
}

impl Relation {
    /// Whether a child outcome settles the whole group.
    ///
    /// `And` is decided by the first unsatisfied child, `Or` by the first
    /// satisfied one. Both tree walkers short-circuit on this.
    #[must_use]
    pub fn decides(self, satisfied: bool) -> bool {
        match self {
            Self::And => !satisfied,
            Self::Or => satisfied,
        }
    }

    /// Outcome of a group whose children were all visited without a decision.
    #[must_use]
    pub fn exhausted(self) -> bool {
        match self {
            Self::And => true,
            Self::Or => false,
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => f.write_str("and"),
            Self::Or => f.write_str("or"),
        }
    }
}

/// Evaluation context a leaf is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionCategory {
    /// One-shot checks: opening a form, "run now", previews.
    Startup,
    /// Unattended periodic firing by the auto-trigger scheduler.
    AutoTrigger,
}

impl fmt::Display for ConditionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Startup => f.write_str("startup"),
            Self::AutoTrigger => f.write_str("autoTrigger"),
        }
    }
}

/// A leaf whose `config` payload does not fit its kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{kind} condition has no config")]
    Missing { kind: String },
    #[error("{kind} condition config is malformed: {reason}")]
    Malformed { kind: String, reason: String },
    #[error("{0}")]
    Invalid(String),
}

fn default_enabled() -> bool {
    true
}

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(default)]
    pub id: String,
    pub kind: ConditionKind,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub relation: Relation,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<ConditionCategory>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub config: Value,
}

impl Condition {
    /// Build a group node.
    #[must_use]
    pub fn group(relation: Relation, children: Vec<Condition>) -> Self {
        Self {
            id: String::new(),
            kind: ConditionKind::Group,
            enabled: true,
            relation,
            children,
            category: None,
            config: Value::Null,
        }
    }

    /// Build a leaf node carrying a raw config payload.
    #[must_use]
    pub fn leaf(kind: ConditionKind, config: Value) -> Self {
        Self {
            id: String::new(),
            kind,
            enabled: true,
            relation: Relation::And,
            children: Vec::new(),
            category: None,
            config,
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: ConditionCategory) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn is_group(&self) -> bool {
        self.kind == ConditionKind::Group
    }

    /// Whether this node takes part in an evaluation under `category`.
    ///
    /// Untagged nodes apply everywhere.
    #[must_use]
    pub fn applies_to(&self, category: ConditionCategory) -> bool {
        self.category.is_none_or(|own| own == category)
    }

    /// Whether the tree holds an enabled leaf explicitly tagged with `category`,
    /// reachable through enabled groups.
    #[must_use]
    pub fn has_enabled_leaf_tagged(&self, category: ConditionCategory) -> bool {
        if !self.enabled {
            return false;
        }
        if self.is_group() {
            return self
                .children
                .iter()
                .any(|child| child.has_enabled_leaf_tagged(category));
        }
        self.category == Some(category)
    }

    /// Parse the raw `config` into the typed config of this node's kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no config is present and
    /// [`ConfigError::Malformed`] when it does not deserialize into `T`.
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        if self.config.is_null() {
            return Err(ConfigError::Missing {
                kind: self.kind.to_string(),
            });
        }
        serde_json::from_value(self.config.clone()).map_err(|err| ConfigError::Malformed {
            kind: self.kind.to_string(),
            reason: err.to_string(),
        })
    }

    /// Short label used in evaluation details.
    #[must_use]
    pub fn label(&self) -> String {
        if self.id.is_empty() {
            self.kind.to_string()
        } else {
            format!("{} '{}'", self.kind, self.id)
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_group() {
            write!(f, "group({}, {} children)", self.relation, self.children.len())
        } else {
            write!(f, "{}({})", self.kind, self.id)
        }
    }
}
