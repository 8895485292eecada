//! Ad-hoc gate evaluation.

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Map, Value};

use formgate_app::ports::{ActionRunner, EditorWorkspace, FormRepository};
use formgate_domain::condition::{Condition, ConditionCategory};
use formgate_domain::evaluation::EvaluationResult;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for evaluating a condition tree.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    pub conditions: Condition,
    pub form_path: Option<String>,
    pub category: Option<ConditionCategory>,
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// `POST /api/conditions/evaluate`: evaluate a tree, optionally against a stored form.
///
/// The category defaults to `startup`.
pub async fn evaluate<R, W, A>(
    State(state): State<AppState<R, W, A>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluationResult>, ApiError>
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    let result = state
        .form_service
        .evaluate_tree(
            &req.conditions,
            req.form_path.as_deref(),
            req.values,
            req.category.unwrap_or(ConditionCategory::Startup),
        )
        .await?;
    Ok(Json(result))
}
