//! Editor view reports.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

use formgate_app::ports::{ActionRunner, EditorWorkspace, FormRepository};

use crate::state::AppState;

/// Request body for a view report.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceReport {
    #[serde(default)]
    pub open_files: Vec<String>,
    pub active_file: Option<String>,
}

/// `PUT /api/workspace`: replace the editor's reported views.
pub async fn report<R, W, A>(
    State(state): State<AppState<R, W, A>>,
    Json(req): Json<WorkspaceReport>,
) -> StatusCode
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    state
        .form_service
        .report_workspace(req.open_files, req.active_file)
        .await;
    StatusCode::NO_CONTENT
}
