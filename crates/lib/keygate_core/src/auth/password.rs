//! Password hashing via bcrypt.

use bcrypt::BcryptError;
use tracing::{debug, warn};

use super::AuthError;

/// Default bcrypt cost factor.
pub const DEFAULT_BCRYPT_COST: u32 = 10;

/// Longest password bcrypt can hash without truncation (72 bytes including
/// the NUL terminator).
pub const MAX_PASSWORD_BYTES: usize = 71;

/// Salted one-way password hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_BCRYPT_COST)
    }
}

impl PasswordHasher {
    /// Create a hasher with an explicit bcrypt cost (valid range 4..=31).
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password with a fresh random salt.
    ///
    /// Passwords longer than [`MAX_PASSWORD_BYTES`] are refused rather than
    /// silently truncated.
    pub fn hash(&self, password: &str) -> Result<String, AuthError> {
        bcrypt::non_truncating_hash(password, self.cost).map_err(|e| match e {
            BcryptError::Truncation(_) => AuthError::PasswordTooLong(MAX_PASSWORD_BYTES),
            e => AuthError::Internal(format!("bcrypt hash: {e}")),
        })
    }

    /// Verify a password against a bcrypt hash.
    ///
    /// A malformed stored hash never matches, and neither does a password too
    /// long to have been hashed in full.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match bcrypt::non_truncating_verify(password, hash) {
            Ok(matches) => matches,
            Err(BcryptError::Truncation(len)) => {
                debug!(len, "password exceeds bcrypt input limit");
                false
            }
            Err(e) => {
                warn!(error = %e, "stored password hash could not be parsed");
                false
            }
        }
    }
}
