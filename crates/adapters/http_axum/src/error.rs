//! HTTP error response mapping.
//!
//! Every error body carries a stable `code` next to the human-readable
//! `error`, so a host can tell a missing form from a broken one without
//! parsing messages.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use formgate_domain::error::{FormGateError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    error: String,
}

/// Maps [`FormGateError`] to an HTTP response.
///
/// | error | status | code |
/// |---|---|---|
/// | empty form path | 400 | `empty_path` |
/// | malformed form file | 422 | `malformed_form` |
/// | missing form | 404 | `not_found` |
/// | storage failure | 500 | `storage` |
#[derive(Debug)]
pub struct ApiError(FormGateError);

impl From<FormGateError> for ApiError {
    fn from(err: FormGateError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, ErrorBody) {
        match &self.0 {
            FormGateError::Validation(ValidationError::EmptyPath) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "empty_path",
                    error: "formPath is required".to_string(),
                },
            ),
            FormGateError::Validation(ValidationError::MalformedForm(reason)) => {
                tracing::warn!(%reason, "form file could not be parsed");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody {
                        code: "malformed_form",
                        error: format!("form file is not a valid form configuration: {reason}"),
                    },
                )
            }
            FormGateError::NotFound(err) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "not_found",
                    error: err.to_string(),
                },
            ),
            FormGateError::Storage(err) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "storage",
                        error: "vault storage failed".to_string(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = self.parts();
        (status, Json(body)).into_response()
    }
}
