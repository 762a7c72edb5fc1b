//! Liveness endpoint.

/// `GET /api/auth/health`
pub async fn health_handler() -> &'static str {
    "Auth Service is running!"
}
