use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn lawyer_files_a_pending_case() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;

    let case = common::file_case(&app, &cast, "Paula v. Dan").await;
    assert_eq!(case["status"], "pending");
    assert_eq!(case["category"], "civil");
    assert_eq!(case["plaintiff_lawyer_id"], cast.plaintiff_lawyer.id);
    assert!(case.get("judge_id").is_none());

    let second = common::file_case(&app, &cast, "Paula v. Dan II").await;
    assert_ne!(case["case_number"], second["case_number"]);
}

#[tokio::test]
async fn create_case_rejects_bad_parties() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let token = Some(cast.plaintiff_lawyer.token.as_str());

    let same_party = json!({
        "title": "Paula v. Paula",
        "category": "civil",
        "plaintiff_id": cast.plaintiff.id,
        "defendant_id": cast.plaintiff.id,
    });
    let (status, _) = common::post_json(&app, "/api/cases", &same_party, token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let lawyer_as_party = json!({
        "title": "Paula v. Dev",
        "category": "civil",
        "plaintiff_id": cast.plaintiff.id,
        "defendant_id": cast.defense_lawyer.id,
    });
    let (status, _) = common::post_json(&app, "/api/cases", &lawyer_as_party, token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let bad_category = json!({
        "title": "Paula v. Dan",
        "category": "maritime",
        "plaintiff_id": cast.plaintiff.id,
        "defendant_id": cast.defendant.id,
    });
    let (status, _) = common::post_json(&app, "/api/cases", &bad_category, token).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json(
        &app,
        "/api/cases",
        &json!({
            "title": "Paula v. Dan",
            "category": "civil",
            "plaintiff_id": cast.plaintiff.id,
            "defendant_id": cast.defendant.id,
        }),
        Some(&cast.plaintiff.token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "clients cannot file directly");
}

#[tokio::test]
async fn filing_lawyer_edits_pending_case_only() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let case = common::file_case(&app, &cast, "Paula v. Dan").await;
    let uri = format!("/api/cases/{}", case["id"].as_str().unwrap());

    let (status, resp) = common::patch_json(
        &app,
        &uri,
        &json!({ "title": "Paula v. Dan (amended)", "category": "property" }),
        Some(&cast.plaintiff_lawyer.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["title"], "Paula v. Dan (amended)");
    assert_eq!(resp["category"], "property");
    assert_eq!(resp["description"], case["description"]);

    let (status, _) = common::patch_json(
        &app,
        &uri,
        &json!({ "title": "   " }),
        Some(&cast.plaintiff_lawyer.token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json(
        &app,
        &format!("{uri}/review"),
        &json!({ "approved": true, "judge_id": cast.judge.id }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = common::patch_json(
        &app,
        &uri,
        &json!({ "title": "Too late" }),
        Some(&cast.plaintiff_lawyer.token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn approval_requires_a_judge() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let case = common::file_case(&app, &cast, "Paula v. Dan").await;
    let review = format!("/api/cases/{}/review", case["id"].as_str().unwrap());

    let (status, _) = common::post_json(
        &app,
        &review,
        &json!({ "approved": true }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::post_json(
        &app,
        &review,
        &json!({ "approved": true, "judge_id": cast.clerk.id }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "a clerk is not a judge");

    let (status, _) = common::post_json(
        &app,
        &review,
        &json!({ "approved": true, "judge_id": cast.judge.id }),
        Some(&cast.judge.token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN, "only clerks review");

    let (status, resp) = common::post_json(
        &app,
        &review,
        &json!({ "approved": true, "judge_id": cast.judge.id, "note": "Docketed" }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["status"], "approved");
    assert_eq!(resp["judge_id"], cast.judge.id);
    assert_eq!(resp["review_note"], "Docketed");

    let (status, _) = common::post_json(
        &app,
        &review,
        &json!({ "approved": false }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn rejected_case_is_terminal() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let case = common::file_case(&app, &cast, "Paula v. Dan").await;
    let id = case["id"].as_str().unwrap();

    let (status, resp) = common::post_json(
        &app,
        &format!("/api/cases/{id}/review"),
        &json!({ "approved": false, "note": "Outside jurisdiction" }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["status"], "rejected");
    assert!(resp.get("judge_id").is_none());

    let (status, _) = common::put_json(
        &app,
        &format!("/api/cases/{id}/judge"),
        &json!({ "judge_id": cast.judge.id }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn clerk_reassigns_judge() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let other_judge = common::seed_user(&pool, shared_types::UserRole::Judge, "Judge Ortiz").await;
    let id = common::approved_case(&app, &cast).await;

    let (status, resp) = common::put_json(
        &app,
        &format!("/api/cases/{id}/judge"),
        &json!({ "judge_id": other_judge.id }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["judge_id"], other_judge.id);

    // The previous judge loses sight of the case.
    let (status, _) = common::get(&app, &format!("/api/cases/{id}"), Some(&cast.judge.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) =
        common::get(&app, &format!("/api/cases/{id}"), Some(&other_judge.token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn verdict_closes_case_and_cancels_hearings() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let id = common::approved_case(&app, &cast).await;
    let hearing = common::schedule_hearing(&app, &cast, &id, 3).await;

    let verdict = json!({ "outcome": "plaintiff", "summary": "Judgment for the plaintiff" });

    let (status, _) = common::post_json(
        &app,
        &format!("/api/cases/{id}/verdict"),
        &json!({ "outcome": "plaintiff", "summary": "  " }),
        Some(&cast.judge.token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, resp) = common::post_json(
        &app,
        &format!("/api/cases/{id}/verdict"),
        &verdict,
        Some(&cast.judge.token),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{resp}");
    assert_eq!(resp["status"], "closed");
    assert_eq!(resp["verdict"]["outcome"], "plaintiff");
    assert!(resp["closed_at"].as_str().is_some());

    let (_, hearing) = common::get(
        &app,
        &format!("/api/hearings/{}", hearing["id"].as_str().unwrap()),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(hearing["status"], "cancelled");

    let (status, _) = common::post_json(
        &app,
        &format!("/api/cases/{id}/verdict"),
        &verdict,
        Some(&cast.judge.token),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn only_the_assigned_judge_rules() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let other_judge = common::seed_user(&pool, shared_types::UserRole::Judge, "Judge Ortiz").await;
    let id = common::approved_case(&app, &cast).await;

    let (status, _) = common::post_json(
        &app,
        &format!("/api/cases/{id}/verdict"),
        &json!({ "outcome": "dismissed", "summary": "Dismissed" }),
        Some(&other_judge.token),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn verdicts_are_judge_only() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    let case = common::file_case(&app, &cast, "Paula v. Dan").await;

    let (status, _) = common::post_json(
        &app,
        &format!("/api/cases/{}/verdict", case["id"].as_str().unwrap()),
        &json!({ "outcome": "settled", "summary": "Settled" }),
        Some(&cast.clerk.token),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn search_filters_and_paginates() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    for i in 0..3 {
        common::file_case(&app, &cast, &format!("Lease dispute {i}")).await;
    }
    common::file_case(&app, &cast, "Fence boundary").await;

    let (status, resp) = common::get(&app, "/api/cases?q=lease&limit=2", Some(&cast.clerk.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resp["data"].as_array().unwrap().len(), 2);
    assert_eq!(resp["meta"]["total"], 3);
    assert_eq!(resp["meta"]["has_next"], true);

    let (_, resp) = common::get(&app, "/api/cases?status=approved", Some(&cast.clerk.token)).await;
    assert_eq!(resp["meta"]["total"], 0);

    let (status, _) = common::get(&app, "/api/cases?status=bogus", Some(&cast.clerk.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = common::get(&app, "/api/cases?category=bogus", Some(&cast.clerk.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn huge_page_number_returns_empty_page() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    common::file_case(&app, &cast, "Lease dispute").await;

    let uri = format!("/api/cases?page={}", i64::MAX);
    let (status, resp) = common::get(&app, &uri, Some(&cast.clerk.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(resp["data"].as_array().unwrap().is_empty());
    assert_eq!(resp["meta"]["total"], 1);
    assert_eq!(resp["meta"]["has_next"], false);
}

#[tokio::test]
async fn statistics_follow_visibility() {
    let (app, pool, _guard) = common::test_app().await;
    let cast = common::seed_cast(&pool).await;
    common::approved_case(&app, &cast).await;
    common::file_case(&app, &cast, "Still pending").await;

    let (status, stats) = common::get(&app, "/api/cases/statistics", Some(&cast.clerk.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["total"], 2);

    let (_, stats) = common::get(&app, "/api/cases/statistics", Some(&cast.judge.token)).await;
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["by_status"][0]["status"], "approved");

    let (_, stats) = common::get(&app, "/api/cases/statistics", Some(&cast.defense_lawyer.token)).await;
    assert_eq!(stats["total"], 0);
}
