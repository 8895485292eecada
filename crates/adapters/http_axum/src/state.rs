//! Shared application state for axum handlers.

use std::sync::Arc;

use formgate_app::scheduler::AutoTriggerScheduler;
use formgate_app::services::FormService;

/// Application state shared across all axum handlers.
///
/// Generic over the form repository, editor workspace and action runner so
/// handlers avoid dynamic dispatch. `Clone` is implemented manually so the
/// port types themselves do not need to be `Clone`.
pub struct AppState<R, W, A> {
    /// Command layer: gate checks, manual runs and field visibility.
    pub form_service: Arc<FormService<R, W, A>>,
    /// Auto-trigger registry, read for snapshots.
    pub scheduler: Arc<AutoTriggerScheduler<R, W, A>>,
}

impl<R, W, A> Clone for AppState<R, W, A> {
    fn clone(&self) -> Self {
        Self {
            form_service: Arc::clone(&self.form_service),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<R, W, A> AppState<R, W, A> {
    /// Create the state from services already shared with background tasks.
    pub fn new(
        form_service: Arc<FormService<R, W, A>>,
        scheduler: Arc<AutoTriggerScheduler<R, W, A>>,
    ) -> Self {
        Self {
            form_service,
            scheduler,
        }
    }
}
