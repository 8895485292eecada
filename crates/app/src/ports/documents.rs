//! Document store ports: reading documents and editor view state.

use std::future::Future;
use std::sync::Arc;

use serde_json::{Map, Value};

use formgate_domain::error::FormGateError;

/// Read access to the documents of the vault.
///
/// Paths are vault-relative with `/` separators.
pub trait DocumentStore {
    /// Whether a document exists at `path`.
    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, FormGateError>> + Send;

    /// Full text of the document, or `None` when it does not exist.
    fn read_text(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<String>, FormGateError>> + Send;

    /// Front-matter properties of the document.
    ///
    /// `None` when the document does not exist, an empty map when it has no
    /// front-matter block.
    fn read_front_matter(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Map<String, Value>>, FormGateError>> + Send;
}

/// Editor view state as reported by the host application.
pub trait EditorWorkspace {
    /// Documents currently shown in an editor view.
    fn open_files(&self) -> impl Future<Output = Vec<String>> + Send;

    /// Document with focus, if any.
    fn active_file(&self) -> impl Future<Output = Option<String>> + Send;

    /// Replace the reported view state.
    fn set_open_files(
        &self,
        open: Vec<String>,
        active: Option<String>,
    ) -> impl Future<Output = ()> + Send;
}

impl<T: DocumentStore + Send + Sync> DocumentStore for Arc<T> {
    fn exists(&self, path: &str) -> impl Future<Output = Result<bool, FormGateError>> + Send {
        (**self).exists(path)
    }

    fn read_text(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<String>, FormGateError>> + Send {
        (**self).read_text(path)
    }

    fn read_front_matter(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Option<Map<String, Value>>, FormGateError>> + Send {
        (**self).read_front_matter(path)
    }
}

impl<T: EditorWorkspace + Send + Sync> EditorWorkspace for Arc<T> {
    fn open_files(&self) -> impl Future<Output = Vec<String>> + Send {
        (**self).open_files()
    }

    fn active_file(&self) -> impl Future<Output = Option<String>> + Send {
        (**self).active_file()
    }

    fn set_open_files(
        &self,
        open: Vec<String>,
        active: Option<String>,
    ) -> impl Future<Output = ()> + Send {
        (**self).set_open_files(open, active)
    }
}
