//! Field filter: the lightweight matcher behind field visibility rules.
//!
//! Unlike startup gates, filters are evaluated synchronously against values
//! provided by callbacks, so they work for any record, not only documents.
//! They share the short-circuit policy of [`Relation`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::Relation;
use crate::operator::Operator;

/// A node of a visibility rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldFilter {
    Group {
        #[serde(default)]
        relation: Relation,
        #[serde(default)]
        conditions: Vec<FieldFilter>,
    },
    Field {
        property: String,
        #[serde(default)]
        operator: Operator,
        #[serde(default)]
        value: Value,
    },
    Script {
        expression: String,
    },
}

impl FieldFilter {
    /// Evaluate the filter.
    ///
    /// - `lookup` returns the current value of a property, if any.
    /// - `normalize` is applied to both sides of a field comparison.
    /// - `script` evaluates an expression; a script error does not hide the
    ///   field (treated as a match).
    ///
    /// Empty groups match.
    pub fn matches(
        &self,
        lookup: &dyn Fn(&str) -> Option<Value>,
        normalize: &dyn Fn(&Value) -> Value,
        script: &dyn Fn(&str) -> Result<bool, String>,
    ) -> bool {
        match self {
            Self::Group {
                relation,
                conditions,
            } => {
                for condition in conditions {
                    let matched = condition.matches(lookup, normalize, script);
                    if relation.decides(matched) {
                        return matched;
                    }
                }
                conditions.is_empty() || relation.exhausted()
            }
            Self::Field {
                property,
                operator,
                value,
            } => {
                let actual = lookup(property).map(|v| normalize(&v));
                operator.apply(actual.as_ref(), &normalize(value))
            }
            Self::Script { expression } => script(expression).unwrap_or(true),
        }
    }

    /// Every script expression in the filter, in document order.
    #[must_use]
    pub fn scripts(&self) -> Vec<&str> {
        let mut found = Vec::new();
        self.collect_scripts(&mut found);
        found
    }

    fn collect_scripts<'a>(&'a self, found: &mut Vec<&'a str>) {
        match self {
            Self::Group { conditions, .. } => {
                for condition in conditions {
                    condition.collect_scripts(found);
                }
            }
            Self::Field { .. } => {}
            Self::Script { expression } => found.push(expression),
        }
    }
}
