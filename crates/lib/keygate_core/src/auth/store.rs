//! User store abstraction and its in-memory and PostgreSQL implementations.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::models::auth::{Identity, NewIdentity};
use crate::uuid::{new_identity_id, uuidv7};

/// Unique constraint on `users.email`.
const EMAIL_CONSTRAINT: &str = "users_email_key";

/// Unique constraint on `users.username`.
const USERNAME_CONSTRAINT: &str = "users_username_key";

/// User store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Email already registered: {0}")]
    DuplicateEmail(String),

    #[error("Username already taken: {0}")]
    DuplicateUsername(String),

    #[error("User store unavailable: {0}")]
    Unavailable(String),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
}

/// Durable mapping from email/username to identities.
///
/// `save` must reject a duplicate email (checked first) or username
/// atomically, so that racing registrations cannot both be stored.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError>;

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError>;

    /// Exact, case-sensitive lookup.
    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Persist a new identity, returning it with its generated id.
    async fn save(&self, identity: NewIdentity) -> Result<Identity, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    /// Identities keyed by email.
    by_email: HashMap<String, Identity>,
    /// Username → email index.
    usernames: HashMap<String, String>,
}

/// Process-local store, used when no database is configured and in tests.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    state: RwLock<MemoryState>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.by_email.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Enable or disable an account. Returns false if the email is unknown.
    pub async fn set_enabled(&self, email: &str, enabled: bool) -> bool {
        self.update(email, |identity| identity.enabled = enabled).await
    }

    /// Change an account's role. Returns false if the email is unknown.
    pub async fn set_role(&self, email: &str, role: &str) -> bool {
        self.update(email, |identity| identity.role = role.to_string())
            .await
    }

    async fn update(&self, email: &str, apply: impl FnOnce(&mut Identity)) -> bool {
        let mut state = self.state.write().await;
        match state.by_email.get_mut(email) {
            Some(identity) => {
                apply(identity);
                identity.updated_at = touched(identity.created_at);
                true
            }
            None => false,
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().await.by_email.contains_key(email))
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        Ok(self.state.read().await.usernames.contains_key(username))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self.state.read().await.by_email.get(email).cloned())
    }

    async fn save(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let mut state = self.state.write().await;
        if state.by_email.contains_key(&identity.email) {
            return Err(StoreError::DuplicateEmail(identity.email));
        }
        if state.usernames.contains_key(&identity.username) {
            return Err(StoreError::DuplicateUsername(identity.username));
        }
        let identity = identity.with_id(new_identity_id());
        state
            .usernames
            .insert(identity.username.clone(), identity.email.clone());
        state
            .by_email
            .insert(identity.email.clone(), identity.clone());
        Ok(identity)
    }
}

/// `now`, but never earlier than `created_at`.
fn touched(created_at: DateTime<Utc>) -> DateTime<Utc> {
    Utc::now().max(created_at)
}

// ---------------------------------------------------------------------------
// PostgreSQL store
// ---------------------------------------------------------------------------

#[derive(sqlx::FromRow)]
struct IdentityRow {
    id: String,
    email: String,
    username: String,
    password_hash: String,
    first_name: String,
    last_name: String,
    role: String,
    enabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<IdentityRow> for Identity {
    fn from(row: IdentityRow) -> Self {
        Identity {
            id: row.id,
            email: row.email,
            username: row.username,
            password_hash: row.password_hash,
            first_name: row.first_name,
            last_name: row.last_name,
            role: row.role,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Store backed by the `users` table (see `migrations/`).
#[derive(Debug, Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Enable or disable an account. Returns false if the email is unknown.
    pub async fn set_enabled(&self, email: &str, enabled: bool) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET enabled = $2, updated_at = GREATEST(now(), created_at) \
             WHERE email = $1",
        )
        .bind(email)
        .bind(enabled)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Change an account's role. Returns false if the email is unknown.
    pub async fn set_role(&self, email: &str, role: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET role = $2, updated_at = GREATEST(now(), created_at) \
             WHERE email = $1",
        )
        .bind(email)
        .bind(role)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn exists_by_email(&self, email: &str) -> Result<bool, StoreError> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn exists_by_username(&self, username: &str) -> Result<bool, StoreError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)",
        )
        .bind(username)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query_as::<_, IdentityRow>(
            "SELECT id::text AS id, email, username, password_hash, first_name, last_name, \
                    role, enabled, created_at, updated_at \
             FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Identity::from))
    }

    async fn save(&self, identity: NewIdentity) -> Result<Identity, StoreError> {
        let id = uuidv7();
        sqlx::query(
            "INSERT INTO users \
                 (id, email, username, password_hash, first_name, last_name, role, enabled, \
                  created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(id)
        .bind(&identity.email)
        .bind(&identity.username)
        .bind(&identity.password_hash)
        .bind(&identity.first_name)
        .bind(&identity.last_name)
        .bind(&identity.role)
        .bind(identity.enabled)
        .bind(identity.created_at)
        .bind(identity.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_insert_error(e, &identity))?;
        Ok(identity.with_id(id.to_string()))
    }
}

/// Translate a unique-constraint violation into the matching duplicate error.
fn map_insert_error(e: sqlx::Error, identity: &NewIdentity) -> StoreError {
    if let sqlx::Error::Database(db) = &e
        && db.is_unique_violation()
    {
        match db.constraint() {
            Some(EMAIL_CONSTRAINT) => return StoreError::DuplicateEmail(identity.email.clone()),
            Some(USERNAME_CONSTRAINT) => {
                return StoreError::DuplicateUsername(identity.username.clone());
            }
            _ => {}
        }
    }
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StoreError::Unavailable(e.to_string())
        }
        other => StoreError::Db(other),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::auth::RegistrationRequest;

    fn new_identity(email: &str, username: &str) -> NewIdentity {
        let req = RegistrationRequest {
            email: email.into(),
            username: username.into(),
            password: "unused".into(),
            first_name: "First".into(),
            last_name: "Last".into(),
        };
        NewIdentity::from_registration(&req, "$2b$04$hash".into(), Utc::now())
    }

    #[tokio::test]
    async fn save_assigns_id_and_is_findable() {
        let store = MemoryUserStore::new();
        let saved = store.save(new_identity("a@x.com", "alice")).await.unwrap();
        assert!(!saved.id.is_empty());

        assert!(store.exists_by_email("a@x.com").await.unwrap());
        assert!(store.exists_by_username("alice").await.unwrap());
        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found, saved);
    }

    #[tokio::test]
    async fn lookup_is_case_sensitive() {
        let store = MemoryUserStore::new();
        store.save(new_identity("a@x.com", "alice")).await.unwrap();
        assert!(store.find_by_email("A@X.COM").await.unwrap().is_none());
        assert!(!store.exists_by_email("A@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_email_is_reported_before_username() {
        let store = MemoryUserStore::new();
        store.save(new_identity("a@x.com", "alice")).await.unwrap();

        let err = store.save(new_identity("a@x.com", "alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail(e) if e == "a@x.com"));

        let err = store.save(new_identity("b@x.com", "alice")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateUsername(u) if u == "alice"));

        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn concurrent_saves_store_exactly_one() {
        let store = Arc::new(MemoryUserStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .save(new_identity("race@x.com", &format!("racer{i}")))
                        .await
                })
            })
            .collect();

        let mut stored = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                stored += 1;
            }
        }
        assert_eq!(stored, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn admin_updates_touch_updated_at() {
        let store = MemoryUserStore::new();
        let saved = store.save(new_identity("a@x.com", "alice")).await.unwrap();

        assert!(store.set_enabled("a@x.com", false).await);
        assert!(store.set_role("a@x.com", "ADMIN").await);
        assert!(!store.set_enabled("missing@x.com", false).await);

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(!found.enabled);
        assert_eq!(found.role, "ADMIN");
        assert!(found.created_at <= found.updated_at);
        assert_eq!(found.created_at, saved.created_at);
    }

    #[tokio::test]
    async fn empty_store_reports_empty() {
        let store = MemoryUserStore::new();
        assert!(store.is_empty().await);
        assert!(store.find_by_email("").await.unwrap().is_none());
    }
}
