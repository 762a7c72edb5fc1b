//! Credential service: registration and login flows.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use super::jwt::TokenIssuer;
use super::password::PasswordHasher;
use super::store::{StoreError, UserStore};
use super::AuthError;
use crate::models::auth::{
    AuthFailure, AuthResult, Credential, IdentitySummary, NewIdentity, RegistrationRequest,
};

const REGISTERED_MESSAGE: &str = "User registered successfully";
const LOGGED_IN_MESSAGE: &str = "Login successful";
const DUMMY_PASSWORD: &str = "keygate-unknown-account";

/// Registers accounts and authenticates credentials, issuing a token on success.
///
/// Holds no mutable state of its own; clones share the store.
#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    /// Hash at the configured cost, verified against on unknown emails so
    /// both login failures take the same time.
    dummy_hash: Option<Arc<str>>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn UserStore>, hasher: PasswordHasher, tokens: TokenIssuer) -> Self {
        let dummy_hash = hasher.hash(DUMMY_PASSWORD).ok().map(Arc::from);
        Self {
            store,
            hasher,
            tokens,
            dummy_hash,
        }
    }

    /// Token issuer, for adapters that verify bearer tokens.
    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Register a new account.
    ///
    /// Email uniqueness is checked before username uniqueness. A duplicate
    /// rejected by the store itself (a racing registration) is reported the
    /// same way; any other store failure aborts with `Err`.
    pub async fn register(&self, req: &RegistrationRequest) -> Result<AuthResult, AuthError> {
        if self.store.exists_by_email(&req.email).await? {
            debug!(email = %req.email, "registration rejected: email exists");
            return Ok(AuthResult::failure(AuthFailure::DuplicateEmail));
        }
        if self.store.exists_by_username(&req.username).await? {
            debug!(username = %req.username, "registration rejected: username exists");
            return Ok(AuthResult::failure(AuthFailure::DuplicateUsername));
        }

        let password_hash = self.hasher.hash(&req.password)?;
        let identity = NewIdentity::from_registration(req, password_hash, Utc::now());

        let saved = match self.store.save(identity).await {
            Ok(saved) => saved,
            Err(StoreError::DuplicateEmail(email)) => {
                debug!(%email, "registration lost race: email exists");
                return Ok(AuthResult::failure(AuthFailure::DuplicateEmail));
            }
            Err(StoreError::DuplicateUsername(username)) => {
                debug!(%username, "registration lost race: username exists");
                return Ok(AuthResult::failure(AuthFailure::DuplicateUsername));
            }
            Err(e) => return Err(e.into()),
        };

        let token = self.tokens.issue(&saved.username)?;
        info!(id = %saved.id, username = %saved.username, "user registered");
        Ok(AuthResult::success(
            REGISTERED_MESSAGE,
            token,
            IdentitySummary::from(&saved),
        ))
    }

    /// Authenticate with email + password.
    ///
    /// Unknown email and wrong password yield the same failure. The enabled
    /// flag is only consulted once the password has verified.
    pub async fn login(&self, credential: &Credential) -> Result<AuthResult, AuthError> {
        let Some(identity) = self.store.find_by_email(&credential.email).await? else {
            if let Some(dummy) = &self.dummy_hash {
                let _ = self.hasher.verify(&credential.password, dummy);
            }
            debug!("login rejected: unknown email");
            return Ok(AuthResult::failure(AuthFailure::InvalidCredentials));
        };

        if !self
            .hasher
            .verify(&credential.password, &identity.password_hash)
        {
            debug!(username = %identity.username, "login rejected: wrong password");
            return Ok(AuthResult::failure(AuthFailure::InvalidCredentials));
        }

        if !identity.enabled {
            info!(username = %identity.username, "login rejected: account disabled");
            return Ok(AuthResult::failure(AuthFailure::AccountDisabled));
        }

        let token = self.tokens.issue(&identity.username)?;
        info!(username = %identity.username, "user logged in");
        Ok(AuthResult::success(
            LOGGED_IN_MESSAGE,
            token,
            IdentitySummary::from(&identity),
        ))
    }
}
