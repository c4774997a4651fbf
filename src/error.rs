// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::{
    services::{certificate::CertificateError, scoring::ScoringError, submission::SubmitError},
    store::StoreError,
};

/// Global Application Error Enum.
/// Centralizes error handling and mapping to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error
    InternalServerError(String),

    // 400 Bad Request
    BadRequest(String),

    // 400 Bad Request, with a machine-readable breakdown
    Validation {
        message: String,
        details: serde_json::Value,
    },

    // 401 Unauthorized
    AuthError(String),

    // 403 Forbidden (authenticated, but not the owner)
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict (e.g., second attempt at the same exam)
    Conflict(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for AppError {}

/// Implements `IntoResponse` for `AppError`.
/// Converts the error into a JSON response with appropriate HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Internal Server Error" }),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "details": details }),
            ),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "error": msg })),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Record not found".to_string()),
            StoreError::Duplicate => AppError::Conflict("Record already exists".to_string()),
            StoreError::Sqlx(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

/// Lets handlers reject invalid payloads with `payload.validate()?`.
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Maps the submission pipeline's failures onto the HTTP taxonomy.
/// Client mistakes are 4xx with enough detail to fix the request.
impl From<SubmitError> for AppError {
    fn from(err: SubmitError) -> Self {
        match err {
            SubmitError::ExamNotFound(_)
            | SubmitError::CandidateNotFound
            | SubmitError::ResultNotFound(_) => AppError::NotFound(err.to_string()),
            SubmitError::ExamInactive => AppError::BadRequest("This exam is not active".to_string()),
            SubmitError::Scoring(ScoringError::Invalid(issues)) => AppError::Validation {
                message: format!("Invalid submission: {}", issues),
                details: json!(issues),
            },
            SubmitError::Scoring(e @ ScoringError::NoQuestions) => AppError::BadRequest(e.to_string()),
            SubmitError::AlreadyAttempted => {
                AppError::Conflict("You have already attempted this exam".to_string())
            }
            SubmitError::Certificate(e @ CertificateError::NotPassed(_)) => {
                AppError::BadRequest(e.to_string())
            }
            SubmitError::Certificate(e) => AppError::InternalServerError(e.to_string()),
            SubmitError::Store(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::scoring::SubmissionIssues;

    fn status_of(err: SubmitError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn validation_errors_are_bad_requests() {
        let mut errors = validator::ValidationErrors::new();
        errors.add("pass_mark", validator::ValidationError::new("range"));

        let response = AppError::from(errors).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn submission_errors_map_to_client_statuses() {
        assert_eq!(status_of(SubmitError::ExamNotFound(1)), StatusCode::NOT_FOUND);
        assert_eq!(status_of(SubmitError::ExamInactive), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(SubmitError::AlreadyAttempted), StatusCode::CONFLICT);
        assert_eq!(
            status_of(SubmitError::Scoring(ScoringError::Invalid(SubmissionIssues::default()))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SubmitError::Store(StoreError::Duplicate)),
            StatusCode::CONFLICT
        );
    }
}
