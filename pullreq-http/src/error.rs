//! Mapping of service errors onto HTTP responses

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use pullreq_core::Error;
use serde::Serialize;
use tracing::error;

/// `{"error": {"code", "message"}}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: &'static str,
    pub message: String,
}

/// An error response with a machine-readable code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn missing_param(name: &str) -> Self {
        Self::bad_request(format!("{} is required", name))
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        let (status, code) = match &err {
            Error::TeamExists(_) => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
            Error::PullRequestExists(_) => (StatusCode::CONFLICT, "PR_EXISTS"),
            Error::PullRequestNotFound(_)
            | Error::AuthorNotFound(_)
            | Error::UserNotFound(_)
            | Error::TeamNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Error::AlreadyMerged(_) => (StatusCode::CONFLICT, "PR_MERGED"),
            Error::NotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
            Error::NoCandidate(_) => (StatusCode::CONFLICT, "NO_CANDIDATE"),
            Error::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Error::Store { .. } | Error::Config(_) | Error::Io(_) => {
                error!(error = %err, "Request failed");
                return Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "internal server error",
                );
            }
        };
        Self::new(status, code, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetails {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}
