//! Form repository port: durable form configurations.

use std::future::Future;
use std::sync::Arc;

use formgate_domain::error::FormGateError;
use formgate_domain::form::FormConfig;

/// Persistence for [`FormConfig`]s, keyed by their vault-relative path.
pub trait FormRepository {
    /// Paths of every form configuration file.
    fn list_forms(&self) -> impl Future<Output = Result<Vec<String>, FormGateError>> + Send;

    /// Load the form at `path`, or `None` when the file does not exist.
    fn load(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<FormConfig>, FormGateError>> + Send;

    /// Set `lastExecutionTime` on the stored form.
    ///
    /// Implementations re-read the current file and patch only that key so
    /// concurrent edits to other keys are kept.
    fn patch_last_execution_time(
        &self,
        path: &str,
        millis: i64,
    ) -> impl Future<Output = Result<(), FormGateError>> + Send;
}

impl<T: FormRepository + Send + Sync> FormRepository for Arc<T> {
    fn list_forms(&self) -> impl Future<Output = Result<Vec<String>, FormGateError>> + Send {
        (**self).list_forms()
    }

    fn load(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<FormConfig>, FormGateError>> + Send {
        (**self).load(path)
    }

    fn patch_last_execution_time(
        &self,
        path: &str,
        millis: i64,
    ) -> impl Future<Output = Result<(), FormGateError>> + Send {
        (**self).patch_last_execution_time(path, millis)
    }
}
