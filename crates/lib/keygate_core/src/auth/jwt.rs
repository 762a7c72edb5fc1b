//! JWT token issuance and verification.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use tracing::info;

use super::AuthError;
use crate::models::auth::TokenClaims;

/// Default token lifetime: 24 hours.
pub const DEFAULT_TOKEN_EXPIRY_SECS: i64 = 24 * 60 * 60;

/// Signing configuration, fixed for the lifetime of the process.
#[derive(Clone)]
pub struct TokenConfig {
    /// HMAC signing secret.
    pub secret: String,
    /// Token lifetime in seconds.
    pub expiry_secs: i64,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("expiry_secs", &self.expiry_secs)
            .finish()
    }
}

impl TokenConfig {
    /// Reads the signing configuration from the environment.
    ///
    /// | Variable              | Default                              |
    /// |-----------------------|--------------------------------------|
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file |
    /// | `JWT_EXPIRATION_SECS` | `86400`                              |
    pub fn from_env() -> Self {
        Self {
            secret: resolve_jwt_secret(),
            expiry_secs: std::env::var("JWT_EXPIRATION_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_TOKEN_EXPIRY_SECS),
        }
    }
}

/// Issues and verifies HS256 identity tokens.
///
/// The key and lifetime are set at construction and never change; a
/// different lifetime needs a different issuer.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    expiry: Duration,
}

impl fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("keys", &"<redacted>")
            .field("expiry", &self.expiry)
            .finish()
    }
}

impl TokenIssuer {
    pub fn new(secret: &[u8], expiry: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            expiry,
        }
    }

    pub fn from_config(config: &TokenConfig) -> Result<Self, AuthError> {
        Ok(Self::new(
            config.secret.as_bytes(),
            token_lifetime(config.expiry_secs)?,
        ))
    }

    /// Lifetime applied to newly issued tokens.
    pub fn expiry(&self) -> Duration {
        self.expiry
    }

    /// Issue a signed token for `subject`, expiring `expiry` after now.
    pub fn issue(&self, subject: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let exp = now
            .checked_add_signed(self.expiry)
            .ok_or_else(|| AuthError::TokenError(format!("expiry overflows: {}", self.expiry)))?;
        let claims = TokenClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::TokenError(format!("jwt encode: {e}")))
    }

    /// True iff the signature matches, the token has not reached its
    /// embedded expiry, and its subject equals `expected_subject`.
    pub fn verify(&self, token: &str, expected_subject: &str) -> bool {
        match self.verified_claims(token) {
            Some(claims) => claims.sub == expected_subject,
            None => false,
        }
    }

    /// Read the subject claim without checking signature or expiry.
    ///
    /// Callers must not trust the result until `verify` has passed.
    pub fn extract_subject(&self, token: &str) -> Option<String> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();
        decode::<TokenClaims>(token, &self.decoding, &validation)
            .ok()
            .map(|data| data.claims.sub)
    }

    fn verified_claims(&self, token: &str) -> Option<TokenClaims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        let claims = decode::<TokenClaims>(token, &self.decoding, &validation)
            .ok()?
            .claims;
        // jsonwebtoken accepts `exp == now`; an expiry instant is already expired.
        if Utc::now().timestamp() >= claims.exp {
            return None;
        }
        Some(claims)
    }
}

/// Token lifetime from a seconds count, rejecting values chrono cannot represent.
pub fn token_lifetime(secs: i64) -> Result<Duration, AuthError> {
    Duration::try_seconds(secs)
        .ok_or_else(|| AuthError::TokenError(format!("token lifetime out of range: {secs}s")))
}

/// Resolve the JWT secret: env var `JWT_SECRET` → `AUTH_SECRET` → persisted file.
pub fn resolve_jwt_secret() -> String {
    if let Ok(secret) = std::env::var("JWT_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    if let Ok(secret) = std::env::var("AUTH_SECRET")
        && !secret.is_empty()
    {
        return secret;
    }
    resolve_jwt_secret_at(&jwt_secret_path())
}

/// Read the secret persisted at `path`, generating and writing one if absent.
pub fn resolve_jwt_secret_at(path: &Path) -> String {
    if let Ok(existing) = std::fs::read_to_string(path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(path, &secret);
    info!(path = %path.display(), "generated new JWT secret");
    secret
}

/// Path to the persisted JWT secret file.
fn jwt_secret_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("keygate")
        .join("jwt-secret")
}
