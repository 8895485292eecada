//! JSON API handler modules.

#[allow(clippy::missing_errors_doc)]
pub mod conditions;
#[allow(clippy::missing_errors_doc)]
pub mod forms;
pub mod units;
pub mod workspace;

use axum::Router;
use axum::routing::{get, post, put};

use formgate_app::ports::{ActionRunner, EditorWorkspace, FormRepository};

use crate::state::AppState;

/// Build the `/api` sub-router.
pub fn routes<R, W, A>() -> Router<AppState<R, W, A>>
where
    R: FormRepository + Send + Sync + 'static,
    W: EditorWorkspace + Send + Sync + 'static,
    A: ActionRunner + Send + Sync + 'static,
{
    Router::new()
        .route("/units", get(units::list::<R, W, A>))
        .route("/conditions/evaluate", post(conditions::evaluate::<R, W, A>))
        .route("/forms/preview", post(forms::preview::<R, W, A>))
        .route("/forms/run", post(forms::run::<R, W, A>))
        .route("/forms/visibility", post(forms::visibility::<R, W, A>))
        .route("/workspace", put(workspace::report::<R, W, A>))
}
