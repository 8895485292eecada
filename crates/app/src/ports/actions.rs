//! Action runner port: performs a form's effects once its gate passes.

use std::future::Future;
use std::sync::Arc;

use formgate_domain::error::FormGateError;
use formgate_domain::form::FormConfig;

use crate::engine::EvaluationContext;

/// Runs the action chain of a form.
///
/// Callers await completion, successful or not, before releasing the form.
pub trait ActionRunner {
    fn run(
        &self,
        form: &FormConfig,
        ctx: &EvaluationContext,
    ) -> impl Future<Output = Result<(), FormGateError>> + Send;
}

impl<T: ActionRunner + Send + Sync> ActionRunner for Arc<T> {
    fn run(
        &self,
        form: &FormConfig,
        ctx: &EvaluationContext,
    ) -> impl Future<Output = Result<(), FormGateError>> + Send {
        (**self).run(form, ctx)
    }
}
