use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

fn exhibit(title: &str) -> serde_json::Value {
    json!({
        "title": title,
        "description": "Signed lease agreement",
        "evidence_type": "document",
        "file_url": "https://files.courtwise.test/lease.pdf",
    })
}

#[tokio::test]
async fn parties_submit_on_their_own_side() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let id = common::approved_case(&app, &cast).await;
    let uri = format!("/api/cases/{id}/evidence");

    let (status, resp) = common::post_json(&app, &uri, &exhibit("Lease"), Some(&cast.plaintiff_lawyer.token)).await;
    assert_eq!(status, StatusCode::CREATED, "{resp}");
    assert_eq!(resp["side"], "plaintiff");
    assert_eq!(resp["submitted_by"], cast.plaintiff_lawyer.id);

    let (status, resp) = common::post_json(&app, &uri, &exhibit("Receipt"), Some(&cast.defendant.token)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(resp["side"], "defendant");

    let (status, list) = common::get(&app, &uri, Some(&cast.judge.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn non_litigants_cannot_submit() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let id = common::approved_case(&app, &cast).await;
    let uri = format!("/api/cases/{id}/evidence");

    let (status, _) = common::post_json(&app, &uri, &exhibit("Lease"), Some(&cast.clerk.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // A lawyer with no seat on the case cannot see it at all.
    let (status, _) = common::post_json(&app, &uri, &exhibit("Lease"), Some(&cast.defense_lawyer.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn evidence_validation() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let id = common::approved_case(&app, &cast).await;
    let uri = format!("/api/cases/{id}/evidence");
    let token = Some(cast.plaintiff.token.as_str());

    let mut bad_type = exhibit("Lease");
    bad_type["evidence_type"] = json!("hearsay");
    let (status, _) = common::post_json(&app, &uri, &bad_type, token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_url = exhibit("Lease");
    bad_url["file_url"] = json!("not a url");
    let (status, resp) = common::post_json(&app, &uri, &bad_url, token).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(resp["kind"], "ValidationError");
}

#[tokio::test]
async fn only_submitter_deletes_and_closed_cases_are_frozen() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let id = common::approved_case(&app, &cast).await;
    let uri = format!("/api/cases/{id}/evidence");

    let (_, first) = common::post_json(&app, &uri, &exhibit("Lease"), Some(&cast.plaintiff.token)).await;
    let (_, second) = common::post_json(&app, &uri, &exhibit("Photo"), Some(&cast.plaintiff.token)).await;
    let first_uri = format!("/api/evidence/{}", first["id"].as_str().unwrap());
    let second_uri = format!("/api/evidence/{}", second["id"].as_str().unwrap());

    let (status, _) = common::delete(&app, &first_uri, Some(&cast.plaintiff_lawyer.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = common::delete(&app, &first_uri, Some(&cast.plaintiff.token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = common::get(&app, &first_uri, Some(&cast.plaintiff.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::post_json(
        &app,
        &format!("/api/cases/{id}/verdict"),
        &json!({ "outcome": "settled", "summary": "Settled out of court" }),
        Some(&cast.judge.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::delete(&app, &second_uri, Some(&cast.plaintiff.token)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = common::post_json(&app, &uri, &exhibit("Late"), Some(&cast.plaintiff.token)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}
