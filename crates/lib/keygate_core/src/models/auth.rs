//! Authentication domain models.
//!
//! These are internal domain models, distinct from the API DTOs in
//! `keygate_api::models` (which carry `#[serde(rename_all = "camelCase")]`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role assigned to every newly registered identity.
pub const DEFAULT_ROLE: &str = "USER";

/// A registered user's durable record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An identity that has not been persisted yet (no id).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl NewIdentity {
    /// Build the record for a fresh registration: default role, enabled,
    /// `created_at == updated_at == now`.
    pub fn from_registration(
        req: &RegistrationRequest,
        password_hash: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            email: req.email.clone(),
            username: req.username.clone(),
            password_hash,
            first_name: req.first_name.clone(),
            last_name: req.last_name.clone(),
            role: DEFAULT_ROLE.to_string(),
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach a store-generated id.
    pub fn with_id(self, id: String) -> Identity {
        Identity {
            id,
            email: self.email,
            username: self.username,
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            role: self.role,
            enabled: self.enabled,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Public view of an identity. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentitySummary {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
}

impl From<&Identity> for IdentitySummary {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            email: identity.email.clone(),
            username: identity.username.clone(),
            first_name: identity.first_name.clone(),
            last_name: identity.last_name.clone(),
            role: identity.role.clone(),
        }
    }
}

/// Login input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub email: String,
    pub password: String,
}

/// Registration input. Empty strings are accepted as literal values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistrationRequest {
    pub email: String,
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

/// JWT claims embedded in issued tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (the identity's username).
    pub sub: String,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiry (unix timestamp).
    pub exp: i64,
}

/// Expected, user-facing reasons a registration or login did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthFailure {
    DuplicateEmail,
    DuplicateUsername,
    /// Unknown email and wrong password share this variant.
    InvalidCredentials,
    AccountDisabled,
}

impl AuthFailure {
    /// Message returned to the caller.
    pub fn message(&self) -> &'static str {
        match self {
            AuthFailure::DuplicateEmail => "Email already registered",
            AuthFailure::DuplicateUsername => "Username already taken",
            AuthFailure::InvalidCredentials => "Invalid email or password",
            AuthFailure::AccountDisabled => "Account is disabled",
        }
    }
}

impl std::fmt::Display for AuthFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of a registration or login.
///
/// `token` and `user` are present only when `success` is true; `failure`
/// only when it is false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    pub success: bool,
    pub message: String,
    pub token: Option<String>,
    pub user: Option<IdentitySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<AuthFailure>,
}

impl AuthResult {
    pub fn success(message: impl Into<String>, token: String, user: IdentitySummary) -> Self {
        Self {
            success: true,
            message: message.into(),
            token: Some(token),
            user: Some(user),
            failure: None,
        }
    }

    pub fn failure(reason: AuthFailure) -> Self {
        Self {
            success: false,
            message: reason.message().to_string(),
            token: None,
            user: None,
            failure: Some(reason),
        }
    }
}
