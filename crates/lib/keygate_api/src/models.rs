//! Request and response bodies for the HTTP API (camelCase on the wire).

use keygate_core::models::auth::{AuthResult, Credential, IdentitySummary, RegistrationRequest};
use serde::{Deserialize, Serialize};

/// `POST /api/auth/register` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl From<RegisterRequest> for RegistrationRequest {
    fn from(body: RegisterRequest) -> Self {
        RegistrationRequest {
            email: body.email,
            username: body.username,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
        }
    }
}

/// `POST /api/auth/login` body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl From<LoginRequest> for Credential {
    fn from(body: LoginRequest) -> Self {
        Credential {
            email: body.email,
            password: body.password,
        }
    }
}

/// Public user fields returned alongside a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl From<IdentitySummary> for UserInfo {
    fn from(summary: IdentitySummary) -> Self {
        UserInfo {
            id: summary.id,
            email: summary.email,
            username: summary.username,
            first_name: summary.first_name,
            last_name: summary.last_name,
            role: summary.role,
        }
    }
}

/// Body of both register and login responses, success or not.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: Option<String>,
    pub message: String,
    pub success: bool,
    pub user: Option<UserInfo>,
}

impl From<AuthResult> for AuthResponse {
    fn from(result: AuthResult) -> Self {
        AuthResponse {
            token: result.token,
            message: result.message,
            success: result.success,
            user: result.user.map(UserInfo::from),
        }
    }
}

/// `GET /api/auth/me` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub username: String,
}

/// JSON body for error responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
