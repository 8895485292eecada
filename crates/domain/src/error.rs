//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`FormGateError`] via `From`. Storage adapters box their errors into
//! [`FormGateError::Storage`] so the domain stays free of IO crates.

/// Top-level error for fallible formgate operations.
#[derive(Debug, thiserror::Error)]
pub enum FormGateError {
    /// A value violated a domain invariant.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// A requested item does not exist.
    #[error(transparent)]
    NotFound(#[from] NotFoundError),

    /// A persistence or IO failure reported by an adapter.
    #[error("storage error: {0}")]
    Storage(Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A form path was empty.
    #[error("form path must not be empty")]
    EmptyPath,
    /// A form configuration document could not be understood.
    #[error("malformed form configuration: {0}")]
    MalformedForm(String),
}

/// A lookup that found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Kind of thing that was looked up, e.g. `"Form"`.
    pub entity: &'static str,
    /// Identifier used for the lookup.
    pub id: String,
}
