//! # keygate_api
//!
//! HTTP API library for Keygate.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use keygate_core::auth::jwt::token_lifetime;
use keygate_core::auth::{AuthError, CredentialService, PasswordHasher, TokenIssuer, UserStore};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::handlers::{auth, health};

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Registration/login orchestration.
    pub service: CredentialService,
}

impl AppState {
    /// Wire a credential service over `store` using the signing and hashing
    /// settings in `config`. Fails if the token lifetime is out of range.
    pub fn new(store: Arc<dyn UserStore>, config: &ApiConfig) -> Result<Self, AuthError> {
        let tokens = TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            token_lifetime(config.jwt_expiry_secs)?,
        );
        let hasher = PasswordHasher::new(config.bcrypt_cost);
        Ok(Self {
            service: CredentialService::new(store, hasher, tokens),
        })
    }
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::GET_AUTH_HEALTH, get(health::health_handler))
        .route(routes::POST_AUTH_REGISTER, post(auth::register_handler))
        .route(routes::POST_AUTH_LOGIN, post(auth::login_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::GET_AUTH_ME, get(auth::me_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(cors)
        .with_state(state)
}
