mod common;

use std::time::Duration;

use axum::http::StatusCode;
use serde_json::json;
use village_sacco::sacco::loans::LoanAction;

use common::{d, dec, wallet, TestApp};

#[tokio::test]
async fn deposit_then_over_withdraw_keeps_balance() {
    let app = TestApp::new().await;
    let (member_id, token) = app.approved_member(&wallet('1'), "Daudi").await;

    let (status, body) = app
        .post("/api/savings/deposit", Some(&token), json!({ "amount": "150.50" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["saving"]["type"], "deposit");

    let (status, body) = app
        .post("/api/savings/withdraw", Some(&token), json!({ "amount": "200" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Insufficient savings balance");

    let (status, _) = app
        .post("/api/savings/withdraw", Some(&token), json!({ "amount": "50.50" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .get(&format!("/api/savings/{member_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["totalSavings"]), d("100"));
    let history = body["savings"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    // newest first
    assert_eq!(history[0]["type"], "withdrawal");
}

#[tokio::test]
async fn non_positive_amounts_are_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('2'), "Esther").await;

    for amount in ["0", "-5"] {
        let (status, body) = app
            .post("/api/savings/deposit", Some(&token), json!({ "amount": amount }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Please enter a valid deposit amount");
    }
}

#[tokio::test]
async fn members_cannot_read_each_others_savings() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('3'), "Faith").await;
    let (other_id, _) = app.approved_member(&wallet('4'), "Gitau").await;

    let (status, _) = app
        .get(&format!("/api/savings/{other_id}"), Some(&token))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, admin_token) = app.super_admin(&wallet('f')).await;
    let (status, _) = app
        .get(&format!("/api/savings/{other_id}"), Some(&admin_token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn loan_requires_minimum_savings() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('5'), "Halima").await;

    let application = json!({ "amount": "50", "durationMonths": 6, "purpose": "seeds" });
    let (status, body) = app.post("/api/loans", Some(&token), application.clone()).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("at least 10"));

    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "10" }))
        .await;
    let (status, body) = app.post("/api/loans", Some(&token), application).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["loan"]["status"], "pending");
    assert_eq!(dec(&body["loan"]["totalDue"]), d("52.5"));
}

#[tokio::test]
async fn loan_application_validates_input() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('6'), "Imani").await;
    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "100" }))
        .await;

    let cases = [
        json!({ "amount": "0", "durationMonths": 6, "purpose": "tools" }),
        json!({ "amount": "20", "durationMonths": 0, "purpose": "tools" }),
        json!({ "amount": "20", "durationMonths": 6, "purpose": "  " }),
        json!({ "amount": "20", "durationMonths": 6, "purpose": "tools", "interestRateBps": 20000 }),
    ];
    for case in cases {
        let (status, _) = app.post("/api/loans", Some(&token), case.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{case}");
    }
}

#[tokio::test]
async fn full_loan_lifecycle_reaches_repaid() {
    let app = TestApp::new().await;
    let (member_id, token) = app.approved_member(&wallet('7'), "Jabari").await;
    let (_, admin) = app.super_admin(&wallet('e')).await;

    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "100" }))
        .await;
    let (_, body) = app
        .post(
            "/api/loans",
            Some(&token),
            json!({ "amount": "50", "duration": 3, "purpose": "fertilizer" }),
        )
        .await;
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    // pending loans cannot be disbursed
    let (status, _) = app
        .put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": "disburse" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    // disbursed loans only; repaying a pending loan fails
    let (status, _) = app
        .post(&format!("/api/loans/{loan_id}/repay"), Some(&token), json!({ "amount": "10" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    for action in ["approve", "disburse"] {
        let (status, body) = app
            .put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": action }))
            .await;
        assert_eq!(status, StatusCode::OK, "{action}: {body}");
    }

    let (_, body) = app
        .get(&format!("/api/members/status?address={}", wallet('7')), None)
        .await;
    assert_eq!(dec(&body["memberData"]["totalLoansAmount"]), d("50"));

    // overpayment
    let (status, _) = app
        .post(&format!("/api/loans/{loan_id}/repay"), Some(&token), json!({ "amount": "60" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post(&format!("/api/loans/{loan_id}/repay"), Some(&token), json!({ "amount": "20" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loan"]["status"], "disbursed");
    assert_eq!(dec(&body["loan"]["outstanding"]), d("32.5"));

    let (status, body) = app
        .post(&format!("/api/loans/{loan_id}/repay"), Some(&token), json!({ "amount": "32.5" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loan"]["status"], "repaid");
    assert!(body["loan"]["repaidAt"].is_string());

    let member = app.sacco().member_by_id(member_id).await.unwrap();
    assert_eq!(member.total_loans_amount, d("0"));

    let (_, body) = app.get("/api/loans", Some(&token)).await;
    assert_eq!(body["loans"].as_array().unwrap().len(), 1);

    let (_, logs) = app.get("/api/admin/logs", Some(&admin)).await;
    let actions: Vec<&str> = logs["logs"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|log| log["action"].as_str())
        .collect();
    assert_eq!(actions, ["LOAN_DISBURSE", "LOAN_APPROVE"]);
}

#[tokio::test]
async fn disbursement_cannot_exceed_fund_balance() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('8'), "Kamau").await;
    let (_, admin) = app.super_admin(&wallet('e')).await;

    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "100" }))
        .await;
    let (_, body) = app
        .post(
            "/api/loans",
            Some(&token),
            json!({ "amount": "500", "durationMonths": 12, "purpose": "water tank" }),
        )
        .await;
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    app.put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": "approve" }))
        .await;
    let (status, body) = app
        .put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": "disburse" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Insufficient SACCO funds"));

    let (_, body) = app.get("/api/admin/loans?status=approved", Some(&admin)).await;
    assert_eq!(body["loans"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn rejected_loans_stay_rejected() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('9'), "Lulu").await;
    let (_, admin) = app.super_admin(&wallet('e')).await;

    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "100" }))
        .await;
    let (_, body) = app
        .post("/api/loans", Some(&token), json!({ "amount": "30", "durationMonths": 2, "purpose": "school fees" }))
        .await;
    let loan_id = body["loan"]["id"].as_i64().unwrap();

    let (status, body) = app
        .put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": "reject" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["loan"]["status"], "rejected");

    let (status, _) = app
        .put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": "approve" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .put("/api/admin/loans", Some(&admin), json!({ "loanId": loan_id, "action": "forgive" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid request parameters");
}

#[tokio::test]
async fn quote_reports_simple_and_compound_interest() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get("/api/loans/quote?amount=1000&duration=12&rate=1200", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["totalDue"]), d("1120"));
    assert_eq!(dec(&body["projectedCompoundInterest"]), d("126.83"));

    let (status, _) = app.get("/api/loans/quote?amount=1000&duration=0", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn quote_refuses_amounts_too_large_to_price() {
    let app = TestApp::new().await;
    let (status, body) = app
        .get("/api/loans/quote?amount=10000000000000000000000000000&duration=12&rate=1200", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("may not exceed"));

    // compounding 100% a year for fifty years outgrows the decimal range
    let (status, body) = app
        .get("/api/loans/quote?amount=1000000000&duration=600&rate=10000", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Loan figures are too large to quote");

    let (status, body) = app
        .get("/api/loans/quote?amount=1000000000&duration=12&rate=1200", None)
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(dec(&body["totalDue"]), d("1120000000"));
}

#[tokio::test]
async fn oversized_loan_is_rejected_and_loan_list_still_loads() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('a'), "Mosi").await;
    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "20" }))
        .await;

    let (status, body) = app
        .post(
            "/api/loans",
            Some(&token),
            json!({ "amount": "79228162514264337593543950335", "durationMonths": 12, "purpose": "land", "interestRateBps": 10000 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (status, body) = app.get("/api/loans", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["loans"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deposits_above_the_ceiling_leave_savings_untouched() {
    let app = TestApp::new().await;
    let (member_id, token) = app.approved_member(&wallet('b'), "Nia").await;

    for amount in ["1000000000.01", "79228162514264337593543950335"] {
        let (status, body) = app
            .post("/api/savings/deposit", Some(&token), json!({ "amount": amount }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "The deposit amount may not exceed 1000000000");
    }

    let (status, _) = app
        .post("/api/savings/deposit", Some(&token), json!({ "amount": "1000000000" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.get(&format!("/api/savings/{member_id}"), Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dec(&body["totalSavings"]), d("1000000000"));
}

#[tokio::test]
async fn concurrent_disbursements_cannot_overdraw_the_fund() {
    let app = TestApp::with_contract_latency(Duration::from_millis(20)).await;
    let (_, token) = app.approved_member(&wallet('c'), "Oloo").await;
    let (admin_id, admin_token) = app.super_admin(&wallet('e')).await;

    app.post("/api/savings/deposit", Some(&token), json!({ "amount": "100" }))
        .await;
    let mut loan_ids = Vec::new();
    for purpose in ["goats", "beehives"] {
        let (_, body) = app
            .post("/api/loans", Some(&token), json!({ "amount": "80", "durationMonths": 6, "purpose": purpose }))
            .await;
        let loan_id = body["loan"]["id"].as_i64().unwrap();
        app.put("/api/admin/loans", Some(&admin_token), json!({ "loanId": loan_id, "action": "approve" }))
            .await;
        loan_ids.push(loan_id);
    }

    // both pass the up-front balance check before either is written
    let admin = app.sacco().member_by_id(admin_id).await.unwrap();
    let (first, second) = tokio::join!(
        app.sacco().review_loan(&admin, loan_ids[0], LoanAction::Disburse, None),
        app.sacco().review_loan(&admin, loan_ids[1], LoanAction::Disburse, None),
    );
    let outcomes = [first.is_ok(), second.is_ok()];
    assert_eq!(outcomes.iter().filter(|ok| **ok).count(), 1, "{outcomes:?}");
    let err = first.err().or(second.err()).unwrap();
    assert_eq!(err.status_code(), StatusCode::CONFLICT);
    assert!(err.to_string().contains("Insufficient SACCO funds"));

    let (_, stats) = app.get("/api/sacco/stats", None).await;
    assert_eq!(dec(&stats["contractBalance"]), d("20"));
    let (_, body) = app.get("/api/admin/loans?status=disbursed", Some(&admin_token)).await;
    assert_eq!(body["loans"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn malformed_bodies_get_a_json_error() {
    let app = TestApp::new().await;
    let (_, token) = app.approved_member(&wallet('d'), "Pili").await;

    let (status, body) = app
        .post("/api/savings/deposit", Some(&token), json!({ "amount": "lots" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app.get("/api/loans/quote?amount=ten&duration=12", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");

    let (status, body) = app.get("/api/savings/not-a-number", Some(&token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string(), "{body}");
}
