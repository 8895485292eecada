//! Form service: on-demand gate checks, "run now" and field visibility.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use formgate_domain::condition::{Condition, ConditionCategory};
use formgate_domain::error::{FormGateError, NotFoundError, ValidationError};
use formgate_domain::evaluation::EvaluationResult;
use formgate_domain::form::FormConfig;
use formgate_domain::operator::is_truthy;
use formgate_domain::time::{self, Timestamp};

use crate::engine::evaluators::{ScriptEvaluator, script_scope};
use crate::engine::{ConditionEngine, EvaluationContext, HostInfo};
use crate::ports::{ActionRunner, EditorWorkspace, FormRepository, ScriptHost};

/// Result of a manual run.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// The gate held and the actions ran at `fired_at` (epoch ms).
    Executed { fired_at: i64 },
    /// The gate blocked execution.
    Blocked(EvaluationResult),
}

/// Application service for the host's command layer.
pub struct FormService<R, W, A> {
    engine: Arc<ConditionEngine>,
    forms: R,
    workspace: W,
    runner: A,
    scripts: ScriptEvaluator,
    host: HostInfo,
}

impl<R, W, A> FormService<R, W, A>
where
    R: FormRepository + Send + Sync,
    W: EditorWorkspace + Send + Sync,
    A: ActionRunner + Send + Sync,
{
    /// Create a new service over the given ports.
    pub fn new(
        engine: Arc<ConditionEngine>,
        forms: R,
        workspace: W,
        runner: A,
        scripts: Arc<dyn ScriptHost>,
        host: HostInfo,
    ) -> Self {
        Self {
            engine,
            forms,
            workspace,
            runner,
            scripts: ScriptEvaluator::new(scripts),
            host,
        }
    }

    /// Deadline for each visibility script.
    #[must_use]
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.scripts = self.scripts.with_timeout(timeout);
        self
    }

    /// Evaluate a gate. Never fails: every problem is reported in the result.
    pub async fn evaluate_conditions(
        &self,
        tree: Option<&Condition>,
        ctx: &EvaluationContext,
        category: ConditionCategory,
    ) -> EvaluationResult {
        self.engine.evaluate_conditions(tree, ctx, category).await
    }

    /// Load a form, failing when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`FormGateError::Validation`] for an empty path,
    /// [`FormGateError::NotFound`] when no form exists at `path`, or a storage
    /// error from the repository.
    pub async fn get_form(&self, path: &str) -> Result<FormConfig, FormGateError> {
        if path.trim().is_empty() {
            return Err(ValidationError::EmptyPath.into());
        }
        self.forms.load(path).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Form",
                id: path.to_string(),
            }
            .into()
        })
    }

    /// Context at `now` for an optional stored form and runtime values.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::get_form`] when `form_path` is given.
    pub async fn context_for(
        &self,
        form_path: Option<&str>,
        values: Map<String, Value>,
        now: Timestamp,
    ) -> Result<EvaluationContext, FormGateError> {
        let ctx = EvaluationContext::capture(&self.workspace, &self.host, now).await;
        let ctx = match form_path {
            Some(path) => ctx.with_form(path, self.get_form(path).await?),
            None => ctx,
        };
        Ok(ctx.with_values(values))
    }

    /// Evaluate an ad-hoc tree, optionally in the context of a stored form.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::get_form`] when `form_path` is given.
    #[tracing::instrument(skip(self, tree, values))]
    pub async fn evaluate_tree(
        &self,
        tree: &Condition,
        form_path: Option<&str>,
        values: Map<String, Value>,
        category: ConditionCategory,
    ) -> Result<EvaluationResult, FormGateError> {
        let ctx = self.context_for(form_path, values, time::now()).await?;
        Ok(self.evaluate_conditions(Some(tree), &ctx, category).await)
    }

    /// Check a stored form's gate as opening it would.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::get_form`].
    #[tracing::instrument(skip(self, values))]
    pub async fn preview(
        &self,
        path: &str,
        values: Map<String, Value>,
    ) -> Result<EvaluationResult, FormGateError> {
        let ctx = self.context_for(Some(path), values, time::now()).await?;
        let tree = ctx.form.as_ref().and_then(|f| f.startup_conditions.as_ref());
        Ok(self
            .evaluate_conditions(tree, &ctx, ConditionCategory::Startup)
            .await)
    }

    /// Run a form now if its gate holds, recording the execution time.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::get_form`], or with the action runner's error. A
    /// failure to persist the execution time is only logged.
    #[tracing::instrument(skip(self, values))]
    pub async fn run_now(
        &self,
        path: &str,
        values: Map<String, Value>,
    ) -> Result<RunOutcome, FormGateError> {
        let ctx = self.context_for(Some(path), values, time::now()).await?;
        let Some(form) = ctx.form.as_ref() else {
            return Err(NotFoundError {
                entity: "Form",
                id: path.to_string(),
            }
            .into());
        };
        let result = self
            .evaluate_conditions(
                form.startup_conditions.as_ref(),
                &ctx,
                ConditionCategory::Startup,
            )
            .await;
        if !result.satisfied {
            tracing::info!(path, "run blocked by conditions");
            return Ok(RunOutcome::Blocked(result));
        }

        let fired_at = ctx.now_millis();
        let ran = self.runner.run(form, &ctx).await;
        if let Err(err) = self.forms.patch_last_execution_time(path, fired_at).await {
            tracing::warn!(%err, path, "cannot persist last execution time");
        }
        ran?;
        Ok(RunOutcome::Executed { fired_at })
    }

    /// Record the editor's view state as reported by the host.
    pub async fn report_workspace(&self, open: Vec<String>, active: Option<String>) {
        tracing::debug!(open = open.len(), ?active, "workspace reported");
        self.workspace.set_open_files(open, active).await;
    }

    /// Visibility of each field of a stored form, keyed by field id.
    ///
    /// Fields without a rule are visible. Scripts in the rules run up front on
    /// the blocking pool under the script deadline; an error or a timeout
    /// keeps the field visible.
    ///
    /// # Errors
    ///
    /// Fails like [`Self::get_form`].
    #[tracing::instrument(skip(self, values))]
    pub async fn field_visibility(
        &self,
        path: &str,
        values: Map<String, Value>,
    ) -> Result<BTreeMap<String, bool>, FormGateError> {
        let ctx = self.context_for(Some(path), values, time::now()).await?;
        let fields = ctx.form.as_ref().map(|f| f.fields.as_slice()).unwrap_or_default();

        let scope = script_scope(&ctx);
        let mut outcomes: HashMap<&str, Result<bool, String>> = HashMap::new();
        for expression in fields
            .iter()
            .filter_map(|field| field.visible_when.as_ref())
            .flat_map(|rule| rule.scripts())
        {
            if outcomes.contains_key(expression) {
                continue;
            }
            let outcome = match self.scripts.run(expression, scope.clone()).await {
                Ok(value) => Ok(is_truthy(&value)),
                Err(err) => {
                    tracing::debug!(expression, %err, "visibility script failed");
                    Err(err.to_string())
                }
            };
            outcomes.insert(expression, outcome);
        }

        let lookup = |key: &str| ctx.field_value(key);
        let script = |expression: &str| {
            outcomes
                .get(expression)
                .cloned()
                .unwrap_or_else(|| Err(format!("script {expression} was not evaluated")))
        };
        Ok(fields
            .iter()
            .map(|field| {
                let visible = field
                    .visible_when
                    .as_ref()
                    .is_none_or(|rule| rule.matches(&lookup, &normalize, &script));
                (field.id.clone(), visible)
            })
            .collect())
    }
}

/// Comparison form of a field value: trimmed, case-folded strings.
fn normalize(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(s.trim().to_lowercase()),
        other => other.clone(),
    }
}
