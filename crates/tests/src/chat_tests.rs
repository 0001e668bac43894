use axum::{body::Body, http::{Request, StatusCode}};
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::UserRole;
use tower::ServiceExt;

use crate::common;

#[tokio::test]
async fn start_is_idempotent_per_pair() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    let lawyer = common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;

    let (status, first) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": lawyer.id }),
        Some(&client.token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{first}");
    assert_eq!(first["other"]["id"], lawyer.id);
    assert_eq!(first["unread_count"], 0);

    // Same pair from the other side resolves to the same chat.
    let (status, second) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": client.id }),
        Some(&lawyer.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["other"]["id"], client.id);
}

#[tokio::test]
async fn start_validation() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;

    let (status, _) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": client.id }),
        Some(&client.token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": 999_999 }),
        Some(&client.token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn case_linked_chat_requires_visibility() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let stranger = common::seed_user(&pool, UserRole::Client, "Sam Stranger").await;
    let case = common::file_case(&app, &cast, "Paula v. Dan").await;

    let (status, _) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": cast.plaintiff_lawyer.id, "case_id": case["id"] }),
        Some(&stranger.token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, chat) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": cast.plaintiff_lawyer.id, "case_id": case["id"] }),
        Some(&cast.plaintiff.token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(chat["case_id"], case["id"]);
}

#[tokio::test]
async fn messages_unread_counts_and_read_receipts() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    let lawyer = common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;
    let outsider = common::seed_user(&pool, UserRole::Client, "Sam Stranger").await;

    let (_, chat) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": lawyer.id }),
        Some(&client.token),
    )
    .await;
    let chat_id = chat["id"].as_str().unwrap();
    let messages = format!("/api/chats/{chat_id}/messages");

    let (status, _) = common::post_json(&app, &messages, &json!({ "body": "   " }), Some(&client.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    for body in ["Hello", "  Are you free Tuesday?  "] {
        let (status, resp) = common::post_json(&app, &messages, &json!({ "body": body }), Some(&client.token)).await;
        assert_eq!(status, StatusCode::CREATED, "{resp}");
        assert_eq!(resp["sender_id"], client.id);
    }

    let (status, history) = common::get(&app, &messages, Some(&lawyer.token)).await;
    assert_eq!(status, StatusCode::OK);
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["body"], "Hello");
    assert_eq!(history[1]["body"], "Are you free Tuesday?");

    let (_, chats) = common::get(&app, "/api/chats", Some(&lawyer.token)).await;
    assert_eq!(chats[0]["unread_count"], 2);
    assert_eq!(chats[0]["last_message"]["body"], "Are you free Tuesday?");

    let (_, chats) = common::get(&app, "/api/chats", Some(&client.token)).await;
    assert_eq!(chats[0]["unread_count"], 0, "own messages are never unread");

    let (status, _) = common::post_empty(&app, &format!("/api/chats/{chat_id}/read"), Some(&lawyer.token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, chats) = common::get(&app, "/api/chats", Some(&lawyer.token)).await;
    assert_eq!(chats[0]["unread_count"], 0);

    // Outsiders learn nothing about the chat.
    let (status, _) = common::get(&app, &messages, Some(&outsider.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::post_json(&app, &messages, &json!({ "body": "hi" }), Some(&outsider.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = common::post_empty(&app, &format!("/api/chats/{chat_id}/read"), Some(&outsider.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn history_pages_backwards() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    let lawyer = common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;

    let (_, chat) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": lawyer.id }),
        Some(&client.token),
    )
    .await;
    let messages = format!("/api/chats/{}/messages", chat["id"].as_str().unwrap());
    for i in 0..5 {
        common::post_json(&app, &messages, &json!({ "body": format!("m{i}") }), Some(&client.token)).await;
    }

    let (_, page) = common::get(&app, &format!("{messages}?limit=2"), Some(&lawyer.token)).await;
    let page = page.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["body"], "m3");
    assert_eq!(page[1]["body"], "m4");
}

#[tokio::test]
async fn stream_opens_for_participants_only() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    let lawyer = common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;
    let outsider = common::seed_user(&pool, UserRole::Client, "Sam Stranger").await;

    let (_, chat) = common::post_json(
        &app,
        "/api/chats",
        &json!({ "participant_id": lawyer.id }),
        Some(&client.token),
    )
    .await;
    let uri = format!("/api/chats/{}/stream", chat["id"].as_str().unwrap());

    let open = |token: String| {
        Request::builder()
            .uri(uri.as_str())
            .header("authorization", format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap()
    };

    // Only the head is inspected; the event body never ends.
    let response = app.clone().oneshot(open(lawyer.token.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );

    let response = app.clone().oneshot(open(outsider.token.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
