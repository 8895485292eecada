//! Auto-trigger registry snapshot.

use axum::Json;
use axum::extract::State;

use formgate_app::ports::{ActionRunner, EditorWorkspace, FormRepository};
use formgate_app::scheduler::MonitoredUnit;

use crate::state::AppState;

/// `GET /api/units`: monitored forms in path order.
pub async fn list<R, W, A>(State(state): State<AppState<R, W, A>>) -> Json<Vec<MonitoredUnit>>
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    Json(state.scheduler.units())
}
