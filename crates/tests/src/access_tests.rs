use axum::http::StatusCode;
use shared_types::UserRole;

use crate::common;

#[tokio::test]
async fn unauthenticated_requests_are_rejected() {
    let (app, _pool, _guard) = common::test_app().await;

    for uri in ["/api/cases", "/api/hearings", "/api/chats", "/api/dashboard", "/api/lawyers"] {
        let (status, body) = common::get(&app, uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(body["kind"], "Unauthorized");
    }
}

#[tokio::test]
async fn outsiders_get_not_found() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let stranger = common::seed_user(&pool, UserRole::Client, "Sam Stranger").await;
    let id = common::approved_case(&app, &cast).await;
    let uri = format!("/api/cases/{id}");

    for token in [&cast.plaintiff.token, &cast.defendant.token, &cast.plaintiff_lawyer.token, &cast.clerk.token, &cast.judge.token] {
        let (status, _) = common::get(&app, &uri, Some(token)).await;
        assert_eq!(status, StatusCode::OK);
    }

    for token in [&stranger.token, &cast.defense_lawyer.token] {
        let (status, body) = common::get(&app, &uri, Some(token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NotFound");
    }

    let (_, list) = common::get(&app, "/api/cases", Some(&stranger.token)).await;
    assert_eq!(list["meta"]["total"], 0);
}

#[tokio::test]
async fn malformed_ids_are_bad_requests() {
    let (app, pool, _guard) = common::test_app().await;
    let clerk = common::seed_user(&pool, UserRole::Clerk, "Cora Clerk").await;

    let (status, _) = common::get(&app, "/api/cases/not-a-uuid", Some(&clerk.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::get(&app, "/api/users/abc", Some(&clerk.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::get(
        &app,
        "/api/cases/00000000-0000-0000-0000-000000000000",
        Some(&clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn health_reports_database_and_streams() {
    let (_app, pool, _guard) = common::test_app().await;
    let app = server::openapi::api_router(pool);

    let (status, body) = common::get(&app, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "up");
    assert_eq!(body["live_chat_streams"], 0);
}
