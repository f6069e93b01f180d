mod common;

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use common::{wallet, TestApp};

async fn create_proposal(app: &TestApp, token: &str, title: &str) -> i64 {
    let (status, body) = app
        .post(
            "/api/governance",
            Some(token),
            json!({ "title": title, "description": "Raise the monthly contribution" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["proposal"]["id"].as_i64().unwrap()
}

async fn close_voting(app: &TestApp, proposal_id: i64) {
    sqlx::query("UPDATE proposals SET expires_at = ? WHERE proposal_id = ?")
        .bind(Utc::now() - Duration::minutes(1))
        .bind(proposal_id)
        .execute(app.sacco().pool())
        .await
        .unwrap();
}

#[tokio::test]
async fn members_vote_once_per_proposal() {
    let app = TestApp::new().await;
    let (_, alice) = app.approved_member(&wallet('1'), "Achieng").await;
    let (_, bob) = app.approved_member(&wallet('2'), "Bakari").await;
    let proposal_id = create_proposal(&app, &alice, "Contribution increase").await;

    let vote_uri = format!("/api/governance/{proposal_id}/vote");
    let (status, body) = app.post(&vote_uri, Some(&alice), json!({ "support": true })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["proposal"]["yesVotes"], 1);

    let (status, body) = app.post(&vote_uri, Some(&alice), json!({ "support": false })).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "You have already voted on this proposal");

    let (_, body) = app.get(&vote_uri, Some(&alice)).await;
    assert_eq!(body["hasVoted"], true);
    assert_eq!(body["userVote"], true);

    let (_, body) = app.get(&vote_uri, Some(&bob)).await;
    assert_eq!(body["hasVoted"], false);
    assert!(body["userVote"].is_null());
}

#[tokio::test]
async fn proposal_needs_title_and_description() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('3'), "Chausiku").await;
    let (status, _) = app
        .post("/api/governance", Some(&token), json!({ "title": "", "description": "x" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/governance", None, json!({ "title": "t", "description": "d" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn voting_after_expiry_is_rejected_and_finalizes() {
    let app = TestApp::new().await;
    let (_, alice) = app.approved_member(&wallet('1'), "Achieng").await;
    let (_, bob) = app.approved_member(&wallet('2'), "Bakari").await;
    let proposal_id = create_proposal(&app, &alice, "Buy a grain mill").await;

    app.post(&format!("/api/governance/{proposal_id}/vote"), Some(&alice), json!({ "support": true }))
        .await;
    close_voting(&app, proposal_id).await;

    let (status, _) = app
        .post(&format!("/api/governance/{proposal_id}/vote"), Some(&bob), json!({ "support": false }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = app.get("/api/governance?filter=past", None).await;
    let passed = body["proposals"].as_array().unwrap();
    assert_eq!(passed.len(), 1);
    assert_eq!(passed[0]["status"], "passed");

    let (_, body) = app.get("/api/governance", None).await;
    assert!(body["proposals"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn finalization_respects_quorum_and_majority() {
    let config = village_sacco::config::AppConfig {
        quorum_percent: 50,
        ..Default::default()
    };
    let app = TestApp::with_config(config).await;
    let (_, a) = app.approved_member(&wallet('1'), "Asha").await;
    let (_, b) = app.approved_member(&wallet('2'), "Bahati").await;
    app.approved_member(&wallet('3'), "Chege").await;
    app.approved_member(&wallet('4'), "Dalila").await;

    // quorum is two of four approved members
    let quiet = create_proposal(&app, &a, "Too few votes").await;
    let tied = create_proposal(&app, &a, "Split vote").await;

    app.post(&format!("/api/governance/{quiet}/vote"), Some(&a), json!({ "support": true }))
        .await;
    app.post(&format!("/api/governance/{tied}/vote"), Some(&a), json!({ "support": true }))
        .await;
    app.post(&format!("/api/governance/{tied}/vote"), Some(&b), json!({ "support": false }))
        .await;
    close_voting(&app, quiet).await;
    close_voting(&app, tied).await;

    let (_, body) = app.get("/api/governance?filter=expired", None).await;
    assert_eq!(body["proposals"][0]["id"], quiet);
    let (_, body) = app.get("/api/governance?filter=rejected", None).await;
    assert_eq!(body["proposals"][0]["id"], tied);

    let (_, stats) = app.get("/api/governance/stats", None).await;
    assert_eq!(stats["rejectedProposals"], 1);
    assert_eq!(stats["totalVotes"], 3);
    assert_eq!(stats["memberCount"], 4);
}

#[tokio::test]
async fn only_passed_proposals_are_executed_once() {
    let app = TestApp::new().await;
    let (_, member) = app.approved_member(&wallet('1'), "Achieng").await;
    let (_, admin) = app.super_admin(&wallet('f')).await;
    let proposal_id = create_proposal(&app, &member, "Open a second branch").await;
    let execute_uri = format!("/api/governance/{proposal_id}/execute");

    // still active
    let (status, _) = app.post(&execute_uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.post(&format!("/api/governance/{proposal_id}/vote"), Some(&member), json!({ "support": true }))
        .await;
    close_voting(&app, proposal_id).await;

    // members cannot execute
    let (status, _) = app.post(&execute_uri, Some(&member), json!({})).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app.post(&execute_uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["proposal"]["executed"], true);

    let (status, _) = app.post(&execute_uri, Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unknown_filter_is_a_bad_request() {
    let app = TestApp::new().await;
    let (status, _) = app.get("/api/governance?filter=someday", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
