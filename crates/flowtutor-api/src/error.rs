//! HTTP error responses.
//!
//! Every error body is JSON with a stable `error` field. Server-side
//! failures add a `details` string describing what went wrong upstream.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed request fields.
    BadRequest {
        error: String,
        details: Option<String>,
    },
    /// Model invocation, parsing or validation failed.
    Upstream { error: String, details: String },
}

impl ApiError {
    pub fn bad_request(error: impl Into<String>) -> Self {
        ApiError::BadRequest {
            error: error.into(),
            details: None,
        }
    }

    /// Map a service error under a caller-facing message.
    ///
    /// Input errors keep `bad_request_message` as their `error` field.
    pub fn from_service(
        err: flowtutor_core::Error,
        bad_request_message: &str,
        failure_message: &str,
    ) -> Self {
        match err {
            flowtutor_core::Error::InvalidInput(details) => ApiError::BadRequest {
                error: bad_request_message.to_string(),
                details: Some(details),
            },
            other => ApiError::Upstream {
                error: failure_message.to_string(),
                details: other.to_string(),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest {
                error,
                details: None,
            } => (StatusCode::BAD_REQUEST, json!({ "error": error })),
            ApiError::BadRequest {
                error,
                details: Some(details),
            } => (
                StatusCode::BAD_REQUEST,
                json!({ "error": error, "details": details }),
            ),
            ApiError::Upstream { error, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": error, "details": details }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
