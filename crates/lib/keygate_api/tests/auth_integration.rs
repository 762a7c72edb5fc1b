//! Integration test: build the router over an in-memory store and drive the
//! auth endpoints end to end.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use chrono::Duration;
use keygate_api::{AppState, config::ApiConfig};
use keygate_core::auth::{MemoryUserStore, StoreError, TokenIssuer, UserStore};
use keygate_core::models::auth::{Identity, NewIdentity};
use serde_json::{Value, json};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret";

fn test_config() -> ApiConfig {
    ApiConfig {
        bind_addr: "127.0.0.1:0".into(),
        database_url: None,
        jwt_secret: SECRET.into(),
        jwt_expiry_secs: 3600,
        bcrypt_cost: 4,
    }
}

fn app_with(store: Arc<dyn UserStore>) -> Router {
    keygate_api::router(AppState::new(store, &test_config()).expect("valid config"))
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let resp = app.clone().oneshot(req).await.expect("request");
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, json)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_me(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/auth/me");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

fn alice() -> Value {
    json!({
        "email": "a@x.com",
        "username": "alice",
        "password": "p1",
        "firstName": "Alice",
        "lastName": "Liddell",
    })
}

#[tokio::test]
async fn health_endpoint_reports_running() {
    let app = app_with(Arc::new(MemoryUserStore::new()));
    let req = Request::builder()
        .uri("/api/auth/health")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&body[..], b"Auth Service is running!");
}

#[tokio::test]
async fn register_login_and_me_flow() {
    let app = app_with(Arc::new(MemoryUserStore::new()));

    let (status, json) = send(&app, post_json("/api/auth/register", alice())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "User registered successfully");
    assert!(json["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert_eq!(json["user"]["username"], "alice");
    assert_eq!(json["user"]["firstName"], "Alice");
    assert_eq!(json["user"]["lastName"], "Liddell");
    assert_eq!(json["user"]["role"], "USER");
    assert!(json["user"].get("password").is_none());
    assert!(json["user"].get("passwordHash").is_none());

    let (status, json) = send(
        &app,
        post_json(
            "/api/auth/register",
            json!({
                "email": "a@x.com",
                "username": "alice2",
                "password": "p1",
                "firstName": "",
                "lastName": "",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "Email already registered");
    assert!(json["token"].is_null());

    let (status, json) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "a@x.com", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid email or password");
    assert!(json["token"].is_null());

    let (status, json) = send(
        &app,
        post_json("/api/auth/login", json!({"email": "a@x.com", "password": "p1"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Login successful");
    let token = json["token"].as_str().expect("token").to_string();
    assert!(TokenIssuer::new(SECRET.as_bytes(), Duration::hours(1)).verify(&token, "alice"));

    let (status, json) = send(&app, get_me(Some(&format!("Bearer {token}")))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["username"], "alice");
}

#[tokio::test]
async fn duplicate_username_is_a_bad_request() {
    let app = app_with(Arc::new(MemoryUserStore::new()));
    send(&app, post_json("/api/auth/register", alice())).await;

    let mut other = alice();
    other["email"] = json!("b@x.com");
    let (status, json) = send(&app, post_json("/api/auth/register", other)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["message"], "Username already taken");
}

#[tokio::test]
async fn unknown_email_matches_wrong_password_response() {
    let app = app_with(Arc::new(MemoryUserStore::new()));
    send(&app, post_json("/api/auth/register", alice())).await;

    let unknown = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "nobody@x.com", "password": "p1"}),
        ),
    )
    .await;
    let wrong = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "a@x.com", "password": "nope"}),
        ),
    )
    .await;
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn disabled_account_cannot_log_in() {
    let store = Arc::new(MemoryUserStore::new());
    let app = app_with(store.clone());
    send(&app, post_json("/api/auth/register", alice())).await;
    assert!(store.set_enabled("a@x.com", false).await);

    let (status, json) = send(
        &app,
        post_json("/api/auth/login", json!({"email": "a@x.com", "password": "p1"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Account is disabled");
    assert!(json["token"].is_null());
    assert!(json["user"].is_null());
}

#[tokio::test]
async fn me_rejects_missing_or_invalid_tokens() {
    let app = app_with(Arc::new(MemoryUserStore::new()));

    let (status, json) = send(&app, get_me(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["error"], "unauthorized");

    let (status, _) = send(&app, get_me(Some("Basic YWxpY2U6cDE="))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get_me(Some("Bearer not.a.jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let foreign = TokenIssuer::new(b"another-secret", Duration::hours(1))
        .issue("alice")
        .unwrap();
    let (status, _) = send(&app, get_me(Some(&format!("Bearer {foreign}")))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let expired = TokenIssuer::new(SECRET.as_bytes(), Duration::seconds(-60))
        .issue("alice")
        .unwrap();
    let (status, json) = send(&app, get_me(Some(&format!("Bearer {expired}")))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid or expired token");
}

#[tokio::test]
async fn malformed_body_is_rejected_before_the_service() {
    let store = Arc::new(MemoryUserStore::new());
    let app = app_with(store.clone());

    let (status, _) = send(
        &app,
        post_json("/api/auth/register", json!({"email": "a@x.com"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn overlong_password_is_refused_not_truncated() {
    let store = Arc::new(MemoryUserStore::new());
    let app = app_with(store.clone());
    let prefix = "a".repeat(72);

    let mut body = alice();
    body["password"] = json!(format!("{prefix}SECRET"));
    let (status, json) = send(&app, post_json("/api/auth/register", body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "bad_request");
    assert!(store.is_empty().await);

    send(&app, post_json("/api/auth/register", alice())).await;
    let (status, json) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({"email": "a@x.com", "password": format!("{prefix}WRONG")}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json["message"], "Invalid email or password");
}

#[test]
fn out_of_range_token_lifetime_fails_at_startup() {
    let config = ApiConfig {
        jwt_expiry_secs: i64::MAX,
        ..test_config()
    };
    assert!(AppState::new(Arc::new(MemoryUserStore::new()), &config).is_err());
}

/// Store that is always down.
struct UnavailableStore;

#[async_trait]
impl UserStore for UnavailableStore {
    async fn exists_by_email(&self, _email: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn exists_by_username(&self, _username: &str) -> Result<bool, StoreError> {
        Ok(false)
    }

    async fn find_by_email(&self, _email: &str) -> Result<Option<Identity>, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }

    async fn save(&self, _identity: NewIdentity) -> Result<Identity, StoreError> {
        Err(StoreError::Unavailable("connection refused".into()))
    }
}

#[tokio::test]
async fn store_outage_maps_to_service_unavailable() {
    let app = app_with(Arc::new(UnavailableStore));

    let (status, json) = send(&app, post_json("/api/auth/register", alice())).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["error"], "store_unavailable");
    assert!(
        !json["message"]
            .as_str()
            .unwrap_or_default()
            .contains("connection refused")
    );

    let (status, _) = send(
        &app,
        post_json("/api/auth/login", json!({"email": "a@x.com", "password": "p1"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
