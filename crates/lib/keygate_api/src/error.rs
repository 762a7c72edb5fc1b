//! Application error types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use keygate_core::auth::{AuthError, StoreError};
use thiserror::Error;
use tracing::error;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// Expected authentication outcomes are not errors; they travel in the
/// `AuthResponse` body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("User store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Internal server error")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, message) = match &self {
            AppError::StoreUnavailable(m) => {
                error!(error = %m, "user store unavailable");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "User store unavailable",
                )
            }
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, "bad_request", m.as_str()),
            AppError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, "unauthorized", m.as_str()),
            AppError::Internal(m) => {
                error!(error = %m, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Internal server error",
                )
            }
        };
        let body = Json(ErrorResponse {
            error: error.to_string(),
            message: message.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Store(StoreError::Unavailable(msg)) => AppError::StoreUnavailable(msg),
            AuthError::Store(StoreError::Db(e)) => AppError::StoreUnavailable(e.to_string()),
            AuthError::Store(e) => AppError::Internal(e.to_string()),
            e @ AuthError::PasswordTooLong(_) => AppError::BadRequest(e.to_string()),
            AuthError::TokenError(msg) => AppError::Internal(msg),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
