use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;
use shared_types::UserRole;

use crate::common::{self, TEST_PASSWORD};

#[tokio::test]
async fn profile_update_is_partial() {
    let (app, pool, _guard) = common::test_app().await;
    let lawyer = common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;

    let (status, resp) = common::put_json(
        &app,
        "/api/users/me",
        &json!({ "bio": "Twenty years in landlord-tenant law" }),
        Some(&lawyer.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["display_name"], "Lena Lawyer");
    assert_eq!(resp["bio"], "Twenty years in landlord-tenant law");
    assert_eq!(resp["specialization"], "Civil litigation");

    let (status, _) = common::put_json(
        &app,
        "/api/users/me",
        &json!({ "display_name": "  " }),
        Some(&lawyer.token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, me) = common::get(&app, "/api/users/me", Some(&lawyer.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me["bio"], "Twenty years in landlord-tenant law");
}

#[tokio::test]
async fn emails_are_hidden_from_non_staff() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    let lawyer = common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;
    let clerk = common::seed_user(&pool, UserRole::Clerk, "Cora Clerk").await;
    let uri = format!("/api/users/{}", lawyer.id);

    let (status, as_client) = common::get(&app, &uri, Some(&client.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(as_client.get("email").is_none());

    let (_, as_clerk) = common::get(&app, &uri, Some(&clerk.token)).await;
    assert_eq!(as_clerk["email"], lawyer.email);

    let (_, as_self) = common::get(&app, &uri, Some(&lawyer.token)).await;
    assert_eq!(as_self["email"], lawyer.email);

    let (status, _) = common::get(&app, "/api/users/999999", Some(&client.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lawyer_directory_searches() {
    let (app, pool, _guard) = common::test_app().await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    common::seed_user(&pool, UserRole::Lawyer, "Lena Lawyer").await;
    common::seed_user(&pool, UserRole::Lawyer, "Marco Advocate").await;
    common::seed_user(&pool, UserRole::Judge, "Judge Hale").await;

    let (status, all) = common::get(&app, "/api/lawyers", Some(&client.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["meta"]["total"], 2);

    let (_, found) = common::get(&app, "/api/lawyers?q=marco", Some(&client.token)).await;
    assert_eq!(found["meta"]["total"], 1);
    assert_eq!(found["data"][0]["display_name"], "Marco Advocate");
    assert_eq!(found["data"][0]["role"], "lawyer");
}

#[tokio::test]
async fn clerks_list_judges_and_provision_staff() {
    let (app, pool, _guard) = common::test_app().await;
    let clerk = common::seed_user(&pool, UserRole::Clerk, "Cora Clerk").await;
    let client = common::seed_user(&pool, UserRole::Client, "Casey Client").await;
    common::seed_user(&pool, UserRole::Judge, "Judge Hale").await;

    let (status, _) = common::get(&app, "/api/judges", Some(&client.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, judges) = common::get(&app, "/api/judges", Some(&clerk.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(judges.as_array().unwrap().len(), 1);

    let new_judge = json!({
        "email": "ortiz@courtwise.test",
        "password": TEST_PASSWORD,
        "display_name": "Judge Ortiz",
        "role": "judge",
    });
    let (status, _) = common::post_json(&app, "/api/users", &new_judge, Some(&client.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) = common::post_json(&app, "/api/users", &new_judge, Some(&clerk.token)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["role"], "judge");

    let (status, _) = common::post_json(&app, "/api/users", &new_judge, Some(&clerk.token)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, login) = common::post_json(
        &app,
        "/api/auth/login",
        &json!({ "email": "ortiz@courtwise.test", "password": TEST_PASSWORD }),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["role"], "judge");
}
