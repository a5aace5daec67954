//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//!
//! Rejected validation attempts (`invalid`, `expired`, `already_used`, exit
//! not permitted) are not errors. They are ordinary decisions returned in a
//! `ValidationResponse`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Validation Input**: Missing or malformed request fields
/// - **Authentication Errors**: Missing, unknown or revoked bearer tokens
/// - **Authorization Errors**: Caller role may not use the endpoint
/// - **Resource Errors**: Event link does not exist or has ended
/// - **Conflict**: Code uniqueness violation, resampled by the generator
/// - **Infrastructure**: Database failures and malformed stored data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A stored row holds a value this service never writes.
    ///
    /// Returns HTTP 500 Internal Server Error.
    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    /// Bearer token is missing, unknown, or belongs to an inactive account.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or missing token")]
    InvalidToken,

    /// Authenticated caller has the wrong role for this endpoint.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("Forbidden")]
    Forbidden,

    /// No active group code carries this event id.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Event not found or expired")]
    EventNotFound,

    /// The event's group code is past its validity window.
    ///
    /// Returns HTTP 410 Gone.
    #[error("Event has ended")]
    EventEnded,

    /// Generated code collided with an existing one on insert.
    ///
    /// The generator resamples on this variant; it only reaches a client if
    /// a store reports it outside generation.
    #[error("Access code already exists")]
    CodeConflict,

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidRequest` → 400 Bad Request
/// - `InvalidToken` → 401 Unauthorized
/// - `Forbidden` → 403 Forbidden
/// - `EventNotFound` → 404 Not Found
/// - `CodeConflict` → 409 Conflict
/// - `EventEnded` → 410 Gone
/// - `Database`, `CorruptRecord` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::InvalidToken => {
                (StatusCode::UNAUTHORIZED, "invalid_token", self.to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::EventNotFound => {
                (StatusCode::NOT_FOUND, "event_not_found", self.to_string())
            }
            AppError::CodeConflict => (StatusCode::CONFLICT, "code_conflict", self.to_string()),
            AppError::EventEnded => (StatusCode::GONE, "event_ended", self.to_string()),
            AppError::Database(ref e) => {
                tracing::error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
            AppError::CorruptRecord(ref detail) => {
                tracing::error!(detail = %detail, "corrupt record");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
