//! API Error Responses
//!
//! Denials are rendered as GraphQL-style error bodies so clients see the same
//! shape whichever transport carried the mutation.

use agora_common::{ErrorCode, Issue};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::auth::AuthError;
use crate::authz::Denial;

/// HTTP status for each error code.
#[must_use]
pub const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::Unauthenticated => StatusCode::UNAUTHORIZED,
        ErrorCode::InvalidArguments => StatusCode::BAD_REQUEST,
        ErrorCode::ArgumentsAssociatedResourcesNotFound => StatusCode::NOT_FOUND,
        ErrorCode::ForbiddenActionOnArgumentsAssociatedResources => StatusCode::CONFLICT,
        ErrorCode::UnauthorizedActionOnArgumentsAssociatedResources
        | ErrorCode::UnauthorizedArguments => StatusCode::FORBIDDEN,
        ErrorCode::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Serialize)]
pub struct ErrorEntry {
    pub message: String,
    pub extensions: Extensions,
}

#[derive(Debug, Serialize)]
pub struct Extensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<Issue>,
}

impl ErrorBody {
    fn single(message: String, code: Option<ErrorCode>, issues: Vec<Issue>) -> Self {
        Self {
            errors: vec![ErrorEntry {
                message,
                extensions: Extensions { code, issues },
            }],
        }
    }
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let body = ErrorBody::single(self.code.message().to_string(), Some(self.code), self.issues);
        (status_for(self.code), Json(body)).into_response()
    }
}

impl From<AuthError> for Denial {
    fn from(err: AuthError) -> Self {
        match err.code() {
            ErrorCode::Unauthenticated => Self::unauthenticated(),
            _ => {
                tracing::error!(error = %err, "Principal resolution failed");
                Self::unexpected()
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        Denial::from(self).into_response()
    }
}

/// Errors returned by the decision endpoint.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error(transparent)]
    Denied(#[from] Denial),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::UnknownOperation(_) => {
                let body = ErrorBody::single(self.to_string(), None, Vec::new());
                (StatusCode::NOT_FOUND, Json(body)).into_response()
            }
            Self::Denied(denial) => denial.into_response(),
        }
    }
}
