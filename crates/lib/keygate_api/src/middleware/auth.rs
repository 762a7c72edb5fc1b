//! Authentication middleware: Bearer token extraction and JWT verification.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// Identity asserted by a verified bearer token, stored in request extensions.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub username: String,
}

/// Axum middleware: extracts `Authorization: Bearer <token>`, verifies the JWT
/// against its own subject, and injects `AuthenticatedUser` into request
/// extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".into()))?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization scheme".into()))?;

    let tokens = state.service.tokens();
    // The subject is untrusted until `verify` has checked signature and expiry.
    let username = tokens
        .extract_subject(token)
        .filter(|subject| tokens.verify(token, subject))
        .ok_or_else(|| {
            debug!("bearer token rejected");
            AppError::Unauthorized("Invalid or expired token".into())
        })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { username });

    Ok(next.run(request).await)
}
