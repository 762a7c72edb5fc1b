//! API server configuration.

use keygate_core::auth::TokenConfig;
use keygate_core::auth::password::DEFAULT_BCRYPT_COST;

/// Configuration for the API server.
#[derive(Clone)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8080").
    pub bind_addr: String,
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Token lifetime in seconds.
    pub jwt_expiry_secs: i64,
    /// bcrypt cost factor for new password hashes.
    pub bcrypt_cost: u32,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("bind_addr", &self.bind_addr)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("jwt_secret", &"<redacted>")
            .field("jwt_expiry_secs", &self.jwt_expiry_secs)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .finish()
    }
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable           | Default                                     |
    /// |--------------------|---------------------------------------------|
    /// | `BIND_ADDR`        | `127.0.0.1:8080`                            |
    /// | `DATABASE_URL`     | unset (in-memory store)                     |
    /// | `JWT_SECRET` / `AUTH_SECRET` | generated & persisted to file     |
    /// | `JWT_EXPIRATION_SECS` | `86400`                                  |
    /// | `BCRYPT_COST`      | `10`                                        |
    pub fn from_env() -> Self {
        let tokens = TokenConfig::from_env();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into()),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            jwt_secret: tokens.secret,
            jwt_expiry_secs: tokens.expiry_secs,
            bcrypt_cost: env_parse("BCRYPT_COST").unwrap_or(DEFAULT_BCRYPT_COST),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}
