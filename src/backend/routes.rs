use axum::{
    routing::{get, post},
    Router,
};
use crate::backend::{handlers, AppState};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/auth/token", post(handlers::issue_token))
        // members
        .route("/api/members", post(handlers::register_member))
        .route("/api/members/status", get(handlers::member_status))
        // savings
        .route("/api/savings/deposit", post(handlers::deposit_savings))
        .route("/api/savings/withdraw", post(handlers::withdraw_savings))
        .route("/api/savings/{member_id}", get(handlers::savings_history))
        // loans
        .route("/api/loans", get(handlers::my_loans).post(handlers::apply_for_loan))
        .route("/api/loans/quote", get(handlers::loan_quote))
        .route("/api/loans/{loan_id}/repay", post(handlers::repay_loan))
        // governance
        .route(
            "/api/governance",
            get(handlers::list_proposals).post(handlers::create_proposal),
        )
        .route("/api/governance/stats", get(handlers::governance_stats))
        .route(
            "/api/governance/{proposal_id}/vote",
            get(handlers::my_vote).post(handlers::cast_vote),
        )
        .route(
            "/api/governance/{proposal_id}/execute",
            post(handlers::execute_proposal),
        )
        // dashboard
        .route("/api/sacco/stats", get(handlers::sacco_stats))
        .route("/api/contract", get(handlers::current_deployment))
        // admin console
        .route("/api/admin/stats", get(handlers::admin_stats))
        .route("/api/admin/logs", get(handlers::admin_logs))
        .route("/api/admin/transactions", get(handlers::contract_transactions))
        .route(
            "/api/admin/members",
            get(handlers::admin_members).put(handlers::update_member),
        )
        .route(
            "/api/admin/loans",
            get(handlers::admin_loans).put(handlers::review_loan),
        )
        .route(
            "/api/admin/contract",
            post(handlers::deploy_contract).delete(handlers::clear_deployment),
        )
}
