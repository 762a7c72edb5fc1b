//! Authentication request handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use keygate_core::models::auth::{Credential, RegistrationRequest};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::models::{AuthResponse, LoginRequest, MeResponse, RegisterRequest};

/// `POST /api/auth/register`: create a new user account.
///
/// `201 Created` on success, `400 Bad Request` for duplicates or a password
/// too long to hash.
pub async fn register_handler(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let result = state
        .service
        .register(&RegistrationRequest::from(body))
        .await?;
    let status = if result.success {
        StatusCode::CREATED
    } else {
        StatusCode::BAD_REQUEST
    };
    Ok((status, Json(AuthResponse::from(result))))
}

/// `POST /api/auth/login`: authenticate with email + password.
///
/// `200 OK` on success, `401 Unauthorized` otherwise.
pub async fn login_handler(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> AppResult<(StatusCode, Json<AuthResponse>)> {
    let result = state.service.login(&Credential::from(body)).await?;
    let status = if result.success {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    Ok((status, Json(AuthResponse::from(result))))
}

/// `GET /api/auth/me`: the username carried by the caller's bearer token.
pub async fn me_handler(Extension(user): Extension<AuthenticatedUser>) -> Json<MeResponse> {
    Json(MeResponse {
        username: user.username,
    })
}
