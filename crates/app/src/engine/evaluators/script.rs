//! Script leaves: user expressions run through the [`ScriptHost`].
//!
//! The expression sees exactly the scope built here. Evaluation runs on the
//! blocking pool under a deadline; syntax errors, runtime errors and timeouts
//! all yield an unsatisfied result carrying the error.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use formgate_domain::condition::{Condition, ScriptConditionConfig};
use formgate_domain::evaluation::EvaluationResult;
use formgate_domain::operator::is_truthy;

use super::{missing, parse_config};
use crate::engine::{EvaluationContext, LeafEvaluator};
use crate::ports::{ScriptError, ScriptHost};

/// Deadline for one script evaluation.
pub const DEFAULT_SCRIPT_TIMEOUT: Duration = Duration::from_secs(5);

/// Strategy for `script` leaves.
pub struct ScriptEvaluator {
    host: Arc<dyn ScriptHost>,
    timeout: Duration,
}

impl ScriptEvaluator {
    #[must_use]
    pub fn new(host: Arc<dyn ScriptHost>) -> Self {
        Self {
            host,
            timeout: DEFAULT_SCRIPT_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `expression` on the blocking pool under this evaluator's deadline.
    ///
    /// # Errors
    ///
    /// Returns the host's error, [`ScriptError::Runtime`] when the blocking
    /// task panics, or [`ScriptError::Timeout`] once the deadline passes.
    pub async fn run(&self, expression: &str, scope: Map<String, Value>) -> Result<Value, ScriptError> {
        let host = Arc::clone(&self.host);
        let expression = expression.to_string();
        let task = tokio::task::spawn_blocking(move || host.evaluate(&expression, &scope));
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(ScriptError::Runtime(join.to_string())),
            Err(_) => Err(ScriptError::Timeout(
                u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        }
    }
}

/// Variables visible to a condition script.
#[must_use]
pub fn script_scope(ctx: &EvaluationContext) -> Map<String, Value> {
    let mut scope = Map::new();
    scope.insert("formFilePath".into(), ctx.form_file_path.clone().into());
    scope.insert("activeFile".into(), ctx.active_file.clone().into());
    scope.insert("lastExecutionTime".into(), ctx.last_execution_time.into());
    scope.insert("now".into(), ctx.now_millis().into());
    scope.insert("hostVersion".into(), ctx.host_version.clone().into());
    scope.insert("pluginVersion".into(), ctx.plugin_version.clone().into());

    let mut values = ctx.values.clone();
    if let Some(form) = &ctx.form {
        for field in &form.fields {
            if let Some(value) = ctx.field_value(&field.id) {
                values.entry(field.label.clone()).or_insert_with(|| value.clone());
                values.entry(field.id.clone()).or_insert(value);
            }
        }
    }
    scope.insert("values".into(), Value::Object(values));
    scope
}

#[async_trait]
impl LeafEvaluator for ScriptEvaluator {
    async fn evaluate(&self, condition: &Condition, ctx: &EvaluationContext) -> EvaluationResult {
        let config: ScriptConditionConfig = match parse_config(condition) {
            Ok(config) => config,
            Err(result) => return result,
        };
        let expression = config.expression.trim();
        if expression.is_empty() {
            return missing(condition, "expression");
        }
        match self.run(expression, script_scope(ctx)).await {
            Ok(value) => EvaluationResult::from_outcome(
                is_truthy(&value),
                format!("{} returned {value}", condition.label()),
            ),
            Err(err) => {
                tracing::debug!(condition = %condition, %err, "script condition failed");
                EvaluationResult::failed(format!("{} failed", condition.label()), err.to_string())
            }
        }
    }
}
