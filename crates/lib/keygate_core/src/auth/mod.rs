//! Authentication logic.
//!
//! Provides password hashing, JWT issuance/verification, the user store
//! abstraction and the credential service that ties them together. Shared
//! by `keygate_api` and `keygate_cli`.

pub mod jwt;
pub mod password;
pub mod service;
pub mod store;

use thiserror::Error;

pub use jwt::{TokenConfig, TokenIssuer};
pub use password::PasswordHasher;
pub use service::CredentialService;
pub use store::{MemoryUserStore, PgUserStore, StoreError, UserStore};

/// Authentication errors that abort an operation.
///
/// Expected outcomes (duplicate email, wrong password, ...) are not errors;
/// they are reported through `AuthResult`.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Token error: {0}")]
    TokenError(String),

    #[error("Password too long: at most {0} bytes")]
    PasswordTooLong(usize),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
