use std::sync::OnceLock;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware, Router,
};
use serde_json::Value;
use shared_types::UserRole;
use sqlx::{Pool, Postgres};
use tokio::sync::Mutex;
use tower::ServiceExt;

/// Password every seeded account shares.
pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Global mutex ensuring tests run sequentially against the shared database.
/// Each test acquires this lock before truncating, preventing concurrent
/// tests from interfering with each other's data.
static TEST_MUTEX: std::sync::LazyLock<Mutex<()>> = std::sync::LazyLock::new(|| Mutex::new(()));

/// Hashing is slow in debug builds, so every seeded user shares one hash.
static PASSWORD_HASH: OnceLock<String> = OnceLock::new();

/// A seeded account plus a valid access token for it.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
    pub token: String,
}

async fn connect_and_reset() -> Pool<Postgres> {
    let _ = dotenvy::dotenv();
    if std::env::var("JWT_SECRET").is_err() {
        std::env::set_var("JWT_SECRET", "courtwise-test-secret");
    }

    let database_url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .expect("TEST_DATABASE_URL or DATABASE_URL must be set for tests");

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("../../migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    sqlx::query(
        "TRUNCATE messages, chat_reads, chats, evidence, hearing_reschedules, hearings, \
         case_requests, cases, refresh_tokens, users RESTART IDENTITY CASCADE",
    )
    .execute(&pool)
    .await
    .expect("Failed to truncate");

    pool
}

fn build_router(pool: &Pool<Postgres>, max_auth_requests: u32) -> Router {
    let rate_limit = server::rate_limit::RateLimitState::new(
        max_auth_requests,
        std::time::Duration::from_secs(60),
    );
    let state = server::db::AppState::new(pool.clone());
    // The permissive auth middleware decodes bearer tokens for the extractors;
    // unauthenticated requests still pass through.
    server::rest::api_router_with_rate_limit(rate_limit)
        .layer(middleware::from_fn(server::auth::middleware::auth_middleware))
        .with_state(state)
}

/// Build a test router backed by a real Postgres pool with empty tables.
/// The returned `MutexGuard` must be held for the duration of the test.
pub async fn test_app() -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    let guard = TEST_MUTEX.lock().await;
    let pool = connect_and_reset().await;
    let router = build_router(&pool, 10_000);
    (router, pool, guard)
}

/// Build a test router with a tight limit on the credential endpoints.
pub async fn test_app_rate_limited(
    max_requests: u32,
) -> (Router, Pool<Postgres>, tokio::sync::MutexGuard<'static, ()>) {
    let guard = TEST_MUTEX.lock().await;
    let pool = connect_and_reset().await;
    let router = build_router(&pool, max_requests);
    (router, pool, guard)
}

/// Insert a user directly and mint an access token for them.
pub async fn seed_user(pool: &Pool<Postgres>, role: UserRole, name: &str) -> TestUser {
    let hash = PASSWORD_HASH.get_or_init(|| {
        server::auth::password::hash_password(TEST_PASSWORD).expect("Failed to hash password")
    });
    let email = format!("{}@courtwise.test", name.to_lowercase().replace(' ', "."));
    let record = server::repo::user::create(
        pool,
        server::repo::user::NewUser {
            email: &email,
            password_hash: hash,
            display_name: name,
            role,
            phone_number: None,
            specialization: (role == UserRole::Lawyer).then_some("Civil litigation"),
        },
    )
    .await
    .expect("Failed to seed user");

    let token = server::auth::jwt::create_access_token(record.id, &email, role)
        .expect("Failed to create test JWT");
    TestUser { id: record.id, email, role, token }
}

/// The usual cast of a case: two clients, two lawyers, a clerk and a judge.
pub struct Cast {
    pub plaintiff: TestUser,
    pub defendant: TestUser,
    pub plaintiff_lawyer: TestUser,
    pub defense_lawyer: TestUser,
    pub clerk: TestUser,
    pub judge: TestUser,
}

pub async fn seed_cast(pool: &Pool<Postgres>) -> Cast {
    Cast {
        plaintiff: seed_user(pool, UserRole::Client, "Paula Plaintiff").await,
        defendant: seed_user(pool, UserRole::Client, "Dan Defendant").await,
        plaintiff_lawyer: seed_user(pool, UserRole::Lawyer, "Lena Lawyer").await,
        defense_lawyer: seed_user(pool, UserRole::Lawyer, "Dev Counsel").await,
        clerk: seed_user(pool, UserRole::Clerk, "Cora Clerk").await,
        judge: seed_user(pool, UserRole::Judge, "Judge Hale").await,
    }
}

/// File a case as the plaintiff's lawyer. Returns the case JSON.
pub async fn file_case(app: &Router, cast: &Cast, title: &str) -> Value {
    let body = serde_json::json!({
        "title": title,
        "description": "Breach of a residential lease",
        "category": "civil",
        "plaintiff_id": cast.plaintiff.id,
        "defendant_id": cast.defendant.id,
    });
    let (status, resp) = post_json(app, "/api/cases", &body, Some(&cast.plaintiff_lawyer.token)).await;
    assert_eq!(status, StatusCode::CREATED, "file_case failed: {resp}");
    resp
}

/// File a case and have the clerk approve it with the cast's judge.
/// Returns the case id.
pub async fn approved_case(app: &Router, cast: &Cast) -> String {
    let case = file_case(app, cast, "Plaintiff v. Defendant").await;
    let id = case["id"].as_str().expect("case id").to_string();
    let body = serde_json::json!({ "approved": true, "judge_id": cast.judge.id });
    let (status, resp) = post_json(
        app,
        &format!("/api/cases/{id}/review"),
        &body,
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "approve failed: {resp}");
    id
}

/// Schedule a hearing `days` from now as the clerk. Returns the hearing JSON.
pub async fn schedule_hearing(app: &Router, cast: &Cast, case_id: &str, days: i64) -> Value {
    let at = chrono::Utc::now() + chrono::Duration::days(days);
    let body = serde_json::json!({
        "scheduled_at": at.to_rfc3339(),
        "courtroom": "4A",
        "purpose": "Pretrial conference",
    });
    let (status, resp) = post_json(
        app,
        &format!("/api/cases/{case_id}/hearings"),
        &body,
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "schedule failed: {resp}");
    resp
}

fn builder(method: &str, uri: &str, token: Option<&str>) -> axum::http::request::Builder {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        req = req.header("authorization", format!("Bearer {token}"));
    }
    req
}

fn with_json(method: &str, uri: &str, body: &Value, token: Option<&str>) -> Request<Body> {
    builder(method, uri, token)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, builder("GET", uri, token).body(Body::empty()).unwrap()).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send(app, with_json("POST", uri, body, token)).await
}

/// POST with no body, for action endpoints like accept and read.
pub async fn post_empty(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, builder("POST", uri, token).body(Body::empty()).unwrap()).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send(app, with_json("PUT", uri, body, token)).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    body: &Value,
    token: Option<&str>,
) -> (StatusCode, Value) {
    send(app, with_json("PATCH", uri, body, token)).await
}

pub async fn delete(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
    send(app, builder("DELETE", uri, token).body(Body::empty()).unwrap()).await
}

/// POST JSON from a specific client address (for rate limit keys).
pub async fn post_json_from(
    app: &Router,
    uri: &str,
    body: &Value,
    forwarded_for: &str,
) -> (StatusCode, Value) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-forwarded-for", forwarded_for)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

/// Send a request through the router and parse the response.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(req)
        .await
        .expect("Failed to send request");

    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");

    let body: Value = if body_bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body_bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&body_bytes).to_string(),
        ))
    };

    (status, body)
}
