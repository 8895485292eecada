//! Stored form commands: preview, run now and field visibility.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use formgate_app::ports::{ActionRunner, EditorWorkspace, FormRepository};
use formgate_app::services::RunOutcome;
use formgate_domain::evaluation::EvaluationResult;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body naming a stored form.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormRequest {
    pub form_path: String,
    #[serde(default)]
    pub values: Map<String, Value>,
}

/// Gate outcome with its rendered explanation.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExplainedResult {
    #[serde(flatten)]
    pub result: EvaluationResult,
    pub explanation: String,
}

impl From<EvaluationResult> for ExplainedResult {
    fn from(result: EvaluationResult) -> Self {
        let explanation = result.explain();
        Self {
            result,
            explanation,
        }
    }
}

/// Possible responses from the run endpoint.
pub enum RunResponse {
    Executed { fired_at: i64 },
    Blocked(ExplainedResult),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExecutedBody {
    executed: bool,
    fired_at: i64,
}

#[derive(Serialize)]
struct BlockedBody {
    executed: bool,
    #[serde(flatten)]
    result: ExplainedResult,
}

impl IntoResponse for RunResponse {
    fn into_response(self) -> Response {
        match self {
            Self::Executed { fired_at } => Json(ExecutedBody {
                executed: true,
                fired_at,
            })
            .into_response(),
            Self::Blocked(result) => (
                StatusCode::CONFLICT,
                Json(BlockedBody {
                    executed: false,
                    result,
                }),
            )
                .into_response(),
        }
    }
}

/// `POST /api/forms/preview`: check a form's gate without running it.
pub async fn preview<R, W, A>(
    State(state): State<AppState<R, W, A>>,
    Json(req): Json<FormRequest>,
) -> Result<Json<ExplainedResult>, ApiError>
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    let result = state
        .form_service
        .preview(&req.form_path, req.values)
        .await?;
    Ok(Json(result.into()))
}

/// `POST /api/forms/run`: run a form when its gate holds.
pub async fn run<R, W, A>(
    State(state): State<AppState<R, W, A>>,
    Json(req): Json<FormRequest>,
) -> Result<RunResponse, ApiError>
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    let outcome = state
        .form_service
        .run_now(&req.form_path, req.values)
        .await?;
    Ok(match outcome {
        RunOutcome::Executed { fired_at } => RunResponse::Executed { fired_at },
        RunOutcome::Blocked(result) => RunResponse::Blocked(result.into()),
    })
}

/// `POST /api/forms/visibility`: visibility of each field, keyed by field id.
pub async fn visibility<R, W, A>(
    State(state): State<AppState<R, W, A>>,
    Json(req): Json<FormRequest>,
) -> Result<Json<BTreeMap<String, bool>>, ApiError>
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    let visibility = state
        .form_service
        .field_visibility(&req.form_path, req.values)
        .await?;
    Ok(Json(visibility))
}
