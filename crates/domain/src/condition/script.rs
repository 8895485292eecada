//! Script leaf configuration.

use serde::{Deserialize, Serialize};

/// Typed payload of a `script` leaf: an expression coerced to boolean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptConditionConfig {
    pub expression: String,
}
