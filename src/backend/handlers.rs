// src/backend/handlers.rs
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use crate::backend::auth::{client_ip, AdminAccess, MemberAccess};
use crate::backend::extract::{ApiJson, ApiPath, ApiQuery};
use crate::backend::AppState;
use crate::database::models::{LoanStatus, WalletAddress};
use crate::error::{Result, SaccoError};
use crate::sacco::admin::{MemberAction, MemberFilter};
use crate::sacco::governance::ProposalFilter;
use crate::sacco::loans::{self, LoanAction, LoanApplication, LoanView};
use crate::sacco::members::Registration;

/*==========Request Bodies=========== */

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRequest {
    pub wallet_address: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub amount: Decimal,
    pub duration: u32,
    /// Basis points
    pub rate: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProposalRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteRequest {
    pub support: bool,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MembersQuery {
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUpdate {
    pub member_id: Option<i64>,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoansQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanUpdate {
    pub loan_id: Option<i64>,
    pub action: Option<String>,
}

/*==========Auth & Members=========== */

pub async fn issue_token(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<TokenRequest>,
) -> Result<impl IntoResponse> {
    let wallet = WalletAddress::parse(&payload.wallet_address)?;
    let issued = state.tokens.issue(&wallet, Utc::now())?;
    tracing::debug!(%wallet, "session token issued");
    Ok(Json(issued))
}

pub async fn register_member(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<Registration>,
) -> Result<impl IntoResponse> {
    let (member, receipt) = state.sacco.register_member(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "member": { "id": member.id, "name": member.name, "email": member.email },
            "transactionHash": receipt.transaction_hash,
        })),
    ))
}

pub async fn member_status(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<impl IntoResponse> {
    let address = query
        .address
        .filter(|a| !a.trim().is_empty())
        .ok_or_else(|| SaccoError::validation("Wallet address is required"))?;
    Ok(Json(state.sacco.member_status(&address).await?))
}

/*==========Savings=========== */

pub async fn deposit_savings(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiJson(payload): ApiJson<AmountRequest>,
) -> Result<impl IntoResponse> {
    let saving = state.sacco.deposit_savings(&member, payload.amount).await?;
    Ok(Json(json!({
        "success": true,
        "saving": saving,
        "transactionHash": saving.transaction_hash,
    })))
}

pub async fn withdraw_savings(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiJson(payload): ApiJson<AmountRequest>,
) -> Result<impl IntoResponse> {
    let saving = state.sacco.withdraw_savings(&member, payload.amount).await?;
    Ok(Json(json!({
        "success": true,
        "saving": saving,
        "transactionHash": saving.transaction_hash,
    })))
}

pub async fn savings_history(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiPath(member_id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    if member.id != member_id && !member.role.is_admin() {
        return Err(SaccoError::forbidden("You can only view your own savings"));
    }
    Ok(Json(state.sacco.savings_history(member_id).await?))
}

/*==========Loans=========== */

pub async fn my_loans(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
) -> Result<impl IntoResponse> {
    let loans: Vec<LoanView> = state
        .sacco
        .member_loans(member.id)
        .await?
        .into_iter()
        .map(LoanView::try_from)
        .collect::<Result<_>>()?;
    Ok(Json(json!({ "loans": loans })))
}

pub async fn apply_for_loan(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiJson(payload): ApiJson<LoanApplication>,
) -> Result<impl IntoResponse> {
    let loan = state.sacco.apply_for_loan(&member, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "loan": LoanView::try_from(loan.clone())?,
            "transactionHash": loan.transaction_hash,
        })),
    ))
}

pub async fn loan_quote(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QuoteQuery>,
) -> Result<impl IntoResponse> {
    let rate = query.rate.unwrap_or(state.sacco.config().default_interest_bps);
    Ok(Json(loans::quote(query.amount, rate, query.duration)?))
}

pub async fn repay_loan(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiPath(loan_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<AmountRequest>,
) -> Result<impl IntoResponse> {
    let loan = state.sacco.repay_loan(&member, loan_id, payload.amount).await?;
    Ok(Json(json!({ "success": true, "loan": LoanView::try_from(loan)? })))
}

/*==========Governance=========== */

pub async fn list_proposals(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> Result<impl IntoResponse> {
    let filter = match query.filter.as_deref() {
        Some(raw) => raw.parse::<ProposalFilter>()?,
        None => ProposalFilter::default(),
    };
    let proposals = state.sacco.list_proposals(filter).await?;
    Ok(Json(json!({ "proposals": proposals })))
}

pub async fn create_proposal(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiJson(payload): ApiJson<ProposalRequest>,
) -> Result<impl IntoResponse> {
    let proposal = state
        .sacco
        .create_proposal(&member, &payload.title, &payload.description)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "proposal": proposal,
            "transactionHash": proposal.transaction_hash,
        })),
    ))
}

pub async fn governance_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.sacco.governance_stats().await?))
}

pub async fn cast_vote(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiPath(proposal_id): ApiPath<i64>,
    ApiJson(payload): ApiJson<VoteRequest>,
) -> Result<impl IntoResponse> {
    let proposal = state.sacco.vote(&member, proposal_id, payload.support).await?;
    Ok(Json(json!({ "success": true, "proposal": proposal })))
}

pub async fn my_vote(
    State(state): State<AppState>,
    MemberAccess { member }: MemberAccess,
    ApiPath(proposal_id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.sacco.my_vote(&member, proposal_id).await?))
}

pub async fn execute_proposal(
    State(state): State<AppState>,
    AdminAccess { admin }: AdminAccess,
    headers: HeaderMap,
    ApiPath(proposal_id): ApiPath<i64>,
) -> Result<impl IntoResponse> {
    let ip = client_ip(&headers);
    let proposal = state
        .sacco
        .execute_proposal(&admin, proposal_id, ip.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "proposal": proposal })))
}

/*==========Dashboard=========== */

pub async fn sacco_stats(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.sacco.sacco_stats().await?))
}

pub async fn current_deployment(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let deployment = state.sacco.current_deployment().await?;
    Ok(Json(json!({
        "deployed": deployment.is_some(),
        "deployment": deployment,
    })))
}

/*==========Admin Console=========== */

pub async fn admin_stats(
    State(state): State<AppState>,
    _admin: AdminAccess,
) -> Result<impl IntoResponse> {
    Ok(Json(state.sacco.admin_stats().await?))
}

pub async fn admin_logs(
    State(state): State<AppState>,
    _admin: AdminAccess,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<impl IntoResponse> {
    let logs = state.sacco.admin_logs(query.limit.unwrap_or(50)).await?;
    Ok(Json(json!({ "logs": logs })))
}

pub async fn contract_transactions(
    State(state): State<AppState>,
    _admin: AdminAccess,
    ApiQuery(query): ApiQuery<LimitQuery>,
) -> Result<impl IntoResponse> {
    let transactions = state
        .sacco
        .contract_transactions(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(json!({ "transactions": transactions })))
}

pub async fn admin_members(
    State(state): State<AppState>,
    _admin: AdminAccess,
    ApiQuery(query): ApiQuery<MembersQuery>,
) -> Result<impl IntoResponse> {
    let filter = match query.status.as_deref() {
        Some(raw) => raw.parse::<MemberFilter>()?,
        None => MemberFilter::default(),
    };
    let page = state
        .sacco
        .list_members(filter, query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;
    Ok(Json(page))
}

pub async fn update_member(
    State(state): State<AppState>,
    AdminAccess { admin }: AdminAccess,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<MemberUpdate>,
) -> Result<impl IntoResponse> {
    let (Some(member_id), Some(action)) = (payload.member_id, payload.action) else {
        return Err(SaccoError::validation("Invalid request parameters"));
    };
    let action: MemberAction = action.parse()?;
    let ip = client_ip(&headers);

    let member = state
        .sacco
        .update_member(&admin, member_id, action, ip.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "member": member })))
}

pub async fn admin_loans(
    State(state): State<AppState>,
    _admin: AdminAccess,
    ApiQuery(query): ApiQuery<LoansQuery>,
) -> Result<impl IntoResponse> {
    let status = query
        .status
        .as_deref()
        .filter(|s| !s.eq_ignore_ascii_case("all"))
        .map(str::parse::<LoanStatus>)
        .transpose()?;
    let loans: Vec<LoanView> = state
        .sacco
        .all_loans(status)
        .await?
        .into_iter()
        .map(LoanView::try_from)
        .collect::<Result<_>>()?;
    Ok(Json(json!({ "loans": loans })))
}

pub async fn review_loan(
    State(state): State<AppState>,
    AdminAccess { admin }: AdminAccess,
    headers: HeaderMap,
    ApiJson(payload): ApiJson<LoanUpdate>,
) -> Result<impl IntoResponse> {
    let (Some(loan_id), Some(action)) = (payload.loan_id, payload.action) else {
        return Err(SaccoError::validation("Invalid request parameters"));
    };
    let action: LoanAction = action.parse()?;
    let ip = client_ip(&headers);

    let loan = state
        .sacco
        .review_loan(&admin, loan_id, action, ip.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "loan": LoanView::try_from(loan)? })))
}

pub async fn deploy_contract(
    State(state): State<AppState>,
    AdminAccess { admin }: AdminAccess,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ip = client_ip(&headers);
    let deployment = state.sacco.deploy_contract(&admin, ip.as_deref()).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "deployment": deployment })),
    ))
}

pub async fn clear_deployment(
    State(state): State<AppState>,
    AdminAccess { admin }: AdminAccess,
    headers: HeaderMap,
) -> Result<impl IntoResponse> {
    let ip = client_ip(&headers);
    let cleared = state.sacco.clear_deployment(&admin, ip.as_deref()).await?;
    Ok(Json(json!({ "success": true, "cleared": cleared })))
}
