use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use carbuy_core::error::CoreError;
use carbuy_engine::RegistryError;
use serde_json::json;

/// Message returned when a session id is unknown.
pub const MSG_SESSION_NOT_FOUND: &str = "Session not found";

/// Message returned when a session has no result to show.
pub const MSG_RESULTS_NOT_FOUND: &str = "Results not found";

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] and [`RegistryError`] and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `carbuy_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A job registry error from `carbuy_engine`.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A missing resource, with the exact message to return.
    #[error("Not found: {0}")]
    NotFound(&'static str),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- Input validation ---
            AppError::Core(CoreError::Validation(msg)) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }

            // --- Registry errors ---
            AppError::Registry(err) => match err {
                RegistryError::NotFound(_) => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    MSG_SESSION_NOT_FOUND.to_string(),
                ),
                RegistryError::DuplicateSession(id) => (
                    StatusCode::CONFLICT,
                    "CONFLICT",
                    format!("Session {id} already exists"),
                ),
                RegistryError::InvalidTransition { .. } => {
                    tracing::error!(error = %err, "Registry invariant violated");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "INTERNAL_ERROR",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            // --- HTTP-specific errors ---
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.to_string()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
