//! Action runner that reports what a form would do.

use formgate_app::engine::EvaluationContext;
use formgate_app::ports::ActionRunner;
use formgate_domain::error::FormGateError;
use formgate_domain::form::FormConfig;

/// Logs each action of a fired form instead of performing it.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingActionRunner;

impl ActionRunner for LoggingActionRunner {
    async fn run(&self, form: &FormConfig, ctx: &EvaluationContext) -> Result<(), FormGateError> {
        tracing::info!(
            form = %form.id,
            name = %form.name,
            path = ?ctx.form_file_path,
            actions = form.actions.len(),
            "running form"
        );
        for (index, action) in form.actions.iter().enumerate() {
            let kind = action.get("type").and_then(|v| v.as_str()).unwrap_or("unknown");
            tracing::info!(form = %form.id, index, kind, "action");
        }
        Ok(())
    }
}
