//! Archiver error types with HTTP status code mapping.
//!
//! [`ArchiverError`] is the central error type of the crate. The polling
//! pipeline logs it and moves on to the next tick; the query API maps each
//! variant to an HTTP status code and a structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::source::SourceError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 2001,
///     "message": "war not found: 20240605T101010.000Z",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see [`ArchiverError::error_code`]).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Crate-wide error enum.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                 |
/// |-----------|-----------------|-----------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request             |
/// | 2000–2999 | Not Found       | 404 Not Found               |
/// | 3000–3999 | Server          | 500 Internal Server Error   |
/// | 4000–4999 | Upstream data   | 502 Bad Gateway / 422       |
#[derive(Debug, thiserror::Error)]
pub enum ArchiverError {
    /// No archived war with the given end time.
    #[error("war not found: {0}")]
    WarNotFound(String),

    /// The recipient is not subscribed to alerts.
    #[error("subscriber not found: {0}")]
    SubscriberNotFound(i64),

    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// A war snapshot lacks data the pipeline needs (roster, opponent,
    /// parseable timestamps).
    #[error("malformed war snapshot: {0}")]
    MalformedSnapshot(String),

    /// The snapshot source failed.
    #[error("snapshot source error: {0}")]
    Source(#[from] SourceError),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ArchiverError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::WarNotFound(_) => 2001,
            Self::SubscriberNotFound(_) => 2002,
            Self::Internal(_) => 3000,
            Self::Persistence(_) => 3001,
            Self::Source(_) => 4001,
            Self::MalformedSnapshot(_) => 4002,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            Self::WarNotFound(_) | Self::SubscriberNotFound(_) => StatusCode::NOT_FOUND,
            Self::Persistence(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Source(_) => StatusCode::BAD_GATEWAY,
            Self::MalformedSnapshot(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }
}

impl IntoResponse for ArchiverError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ArchiverError::WarNotFound("20240605T101010.000Z".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.error_code(), 2001);
    }

    #[test]
    fn persistence_is_a_server_error() {
        let err = ArchiverError::Persistence("disk I/O error".to_string());
        assert!(err.status_code().is_server_error());
        assert_eq!(err.to_string(), "persistence error: disk I/O error");
    }

    #[test]
    fn into_response_sets_status() {
        let response = ArchiverError::InvalidRequest("bad month".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
