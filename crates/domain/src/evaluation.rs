//! Evaluation result: the outcome of checking a condition tree.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Outcome of evaluating one node, with the children that led to it.
///
/// `details` is a human-readable explanation and never drives control flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    pub satisfied: bool,
    pub details: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub child_results: Vec<EvaluationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EvaluationResult {
    #[must_use]
    pub fn satisfied(details: impl Into<String>) -> Self {
        Self {
            satisfied: true,
            details: details.into(),
            child_results: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn unsatisfied(details: impl Into<String>) -> Self {
        Self {
            satisfied: false,
            details: details.into(),
            child_results: Vec::new(),
            error: None,
        }
    }

    /// An unsatisfied result caused by an error that was caught.
    #[must_use]
    pub fn failed(details: impl Into<String>, error: impl Into<String>) -> Self {
        Self::unsatisfied(details).with_error(error)
    }

    /// Build a result from a boolean outcome.
    #[must_use]
    pub fn from_outcome(satisfied: bool, details: impl Into<String>) -> Self {
        if satisfied {
            Self::satisfied(details)
        } else {
            Self::unsatisfied(details)
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    #[must_use]
    pub fn with_children(mut self, children: Vec<EvaluationResult>) -> Self {
        self.child_results = children;
        self
    }

    /// Render which conditions blocked execution, one line per level.
    ///
    /// A satisfied result renders its own details only.
    #[must_use]
    pub fn explain(&self) -> String {
        let mut out = String::new();
        self.write_blockers(0, &mut out);
        out.trim_end().to_string()
    }

    fn write_blockers(&self, depth: usize, out: &mut String) {
        let _ = write!(out, "{}{}", "  ".repeat(depth), self.details);
        if let Some(err) = &self.error {
            let _ = write!(out, " (error: {err})");
        }
        out.push('\n');
        if self.satisfied {
            return;
        }
        for child in self.child_results.iter().filter(|c| !c.satisfied) {
            child.write_blockers(depth + 1, out);
        }
    }
}
