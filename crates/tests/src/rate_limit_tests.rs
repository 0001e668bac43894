use axum::http::StatusCode;
use serde_json::json;

use crate::common;

fn bad_login() -> serde_json::Value {
    json!({ "email": "nobody@example.com", "password": "wrong-password" })
}

#[tokio::test]
async fn test_rate_limit_returns_429_when_exceeded() {
    let (app, _pool, _guard) = common::test_app_rate_limited(2).await;

    let (s1, _) = common::post_json_from(&app, "/api/auth/login", &bad_login(), "10.0.0.1").await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED, "First request should reach the handler");

    let (s2, _) = common::post_json_from(&app, "/api/auth/login", &bad_login(), "10.0.0.1").await;
    assert_eq!(s2, StatusCode::UNAUTHORIZED, "Second request should reach the handler");

    let (s3, body) = common::post_json_from(&app, "/api/auth/login", &bad_login(), "10.0.0.1").await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS, "Third request should be rate limited");
    assert_eq!(body["kind"], "RateLimited");
}

#[tokio::test]
async fn test_rate_limit_separate_keys() {
    let (app, _pool, _guard) = common::test_app_rate_limited(1).await;

    let (s1, _) = common::post_json_from(&app, "/api/auth/login", &bad_login(), "10.0.0.1").await;
    assert_eq!(s1, StatusCode::UNAUTHORIZED);

    let (s2, _) = common::post_json_from(&app, "/api/auth/login", &bad_login(), "10.0.0.2").await;
    assert_eq!(s2, StatusCode::UNAUTHORIZED);

    let (s3, _) = common::post_json_from(&app, "/api/auth/login", &bad_login(), "10.0.0.1").await;
    assert_eq!(s3, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn domain_routes_are_not_rate_limited() {
    let (app, pool, _guard) = common::test_app_rate_limited(1).await;
    let user = common::seed_user(&pool, shared_types::UserRole::Client, "Casey Client").await;

    for _ in 0..3 {
        let (status, _) = common::get(&app, "/api/cases", Some(&user.token)).await;
        assert_eq!(status, StatusCode::OK);
    }
}
