use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use super::loans::fund_balance;
use super::{require_member, Sacco};
use crate::contract::ContractCall;
use crate::database::db::queries;
use crate::database::models::{
    AdminLog, ContractTransaction, LoanStatus, Member, MemberSummary, ProposalStatus, Role,
};
use crate::error::{Result, SaccoError};

const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberFilter {
    #[default]
    Pending,
    Approved,
    All,
}

impl MemberFilter {
    fn approved(&self) -> Option<bool> {
        match self {
            Self::Pending => Some(false),
            Self::Approved => Some(true),
            Self::All => None,
        }
    }
}

impl FromStr for MemberFilter {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "all" => Ok(Self::All),
            _ => Err(SaccoError::validation("Invalid request parameters")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberAction {
    Approve,
    Reject,
    Activate,
    Deactivate,
    MakeAdmin,
    RemoveAdmin,
}

impl MemberAction {
    fn log_action(&self) -> &'static str {
        match self {
            Self::Approve => "MEMBER_APPROVE",
            Self::Reject => "MEMBER_REJECT",
            Self::Activate => "MEMBER_ACTIVATE",
            Self::Deactivate => "MEMBER_DEACTIVATE",
            Self::MakeAdmin => "MEMBER_MAKEADMIN",
            Self::RemoveAdmin => "MEMBER_REMOVEADMIN",
        }
    }

    fn changes_role(&self) -> bool {
        matches!(self, Self::MakeAdmin | Self::RemoveAdmin)
    }
}

impl FromStr for MemberAction {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "activate" => Ok(Self::Activate),
            "deactivate" => Ok(Self::Deactivate),
            "makeAdmin" => Ok(Self::MakeAdmin),
            "removeAdmin" => Ok(Self::RemoveAdmin),
            _ => Err(SaccoError::validation("Invalid request parameters")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Pagination {
    pub total: i64,
    pub pages: i64,
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    pub fn new(total: i64, page: i64, limit: i64) -> Self {
        let pages = if total == 0 { 0 } else { (total + limit - 1) / limit };
        Self { total, pages, page, limit }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MemberPage {
    pub members: Vec<MemberSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_members: i64,
    pub pending_members: i64,
    pub total_loans: i64,
    pub active_loans: i64,
    pub total_savings: Decimal,
    pub total_loan_amount: Decimal,
    pub total_transactions: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaccoStats {
    pub total_members: i64,
    pub total_savings: Decimal,
    pub total_loans: Decimal,
    pub active_proposals: i64,
    pub contract_balance: Decimal,
    pub pending_members: i64,
    pub approved_loans: i64,
    pub completed_loans: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentInfo {
    pub address: String,
    pub admin: String,
    pub deployed_at: chrono::DateTime<Utc>,
    pub explorer_url: String,
}

/// Whether `admin` may apply `action` to `target`.
fn check_authority(admin: &Member, target: &Member, action: MemberAction) -> Result<()> {
    if target.role == Role::SuperAdmin && admin.role != Role::SuperAdmin {
        return Err(SaccoError::forbidden("Only a super admin can manage a super admin"));
    }
    if target.id == admin.id
        && matches!(action, MemberAction::Reject | MemberAction::Deactivate | MemberAction::RemoveAdmin)
    {
        return Err(SaccoError::forbidden("Administrators cannot revoke their own access"));
    }
    if action.changes_role() {
        if admin.role != Role::SuperAdmin {
            return Err(SaccoError::forbidden("Only a super admin can change member roles"));
        }
        if target.role == Role::SuperAdmin {
            return Err(SaccoError::forbidden("A super admin's role cannot be changed"));
        }
    }
    Ok(())
}

impl Sacco {
    pub async fn list_members(&self, filter: MemberFilter, page: i64, limit: i64) -> Result<MemberPage> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);
        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| SaccoError::validation("Invalid request parameters"))?;

        let members = queries::list_members(&self.pool, filter.approved(), limit, offset).await?;
        let total = queries::count_members(&self.pool, filter.approved()).await?;
        Ok(MemberPage {
            members,
            pagination: Pagination::new(total, page, limit),
        })
    }

    pub async fn update_member(
        &self,
        admin: &Member,
        member_id: i64,
        action: MemberAction,
        ip_address: Option<&str>,
    ) -> Result<Member> {
        let target = self.member_by_id(member_id).await?;
        check_authority(admin, &target, action)?;

        let submitted = match action {
            MemberAction::Approve => Some(
                self.submit(
                    &admin.wallet_address,
                    ContractCall::ApproveMember {
                        member: target.wallet_address.clone(),
                    },
                )
                .await?,
            ),
            _ => None,
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        match action {
            MemberAction::Approve => queries::set_member_approved(&mut *tx, member_id, true).await?,
            MemberAction::Reject => queries::set_member_approved(&mut *tx, member_id, false).await?,
            MemberAction::Activate => queries::set_member_active(&mut *tx, member_id, true).await?,
            MemberAction::Deactivate => queries::set_member_active(&mut *tx, member_id, false).await?,
            MemberAction::MakeAdmin => queries::set_member_role(&mut *tx, member_id, Role::Admin).await?,
            MemberAction::RemoveAdmin => queries::set_member_role(&mut *tx, member_id, Role::Member).await?,
        };
        if let Some(submitted) = &submitted {
            Self::record(&mut tx, submitted, &admin.wallet_address, Some(member_id), now).await?;
        }
        queries::insert_admin_log(
            &mut *tx,
            action.log_action(),
            &format!("Member ID: {member_id}"),
            admin.id,
            ip_address,
            now,
        )
        .await?;
        let updated = require_member(&mut tx, member_id).await?;
        tx.commit().await?;

        tracing::info!(member_id, admin_id = admin.id, action = action.log_action(), "member updated");
        Ok(updated)
    }

    pub async fn admin_stats(&self) -> Result<AdminStats> {
        let approved = queries::count_loans(&self.pool, Some(LoanStatus::Approved)).await?;
        let disbursed = queries::count_loans(&self.pool, Some(LoanStatus::Disbursed)).await?;
        Ok(AdminStats {
            total_members: queries::count_members(&self.pool, Some(true)).await?,
            pending_members: queries::count_members(&self.pool, Some(false)).await?,
            total_loans: queries::count_loans(&self.pool, None).await?,
            active_loans: approved + disbursed,
            total_savings: queries::sum_member_savings(&self.pool).await?,
            total_loan_amount: queries::sum_loan_amounts(&self.pool).await?,
            total_transactions: queries::count_contract_transactions(&self.pool).await?,
        })
    }

    pub async fn sacco_stats(&self) -> Result<SaccoStats> {
        self.finalize_expired(Utc::now()).await?;
        let contract_balance = {
            let mut conn = self.pool.acquire().await?;
            fund_balance(&mut conn).await?
        };
        Ok(SaccoStats {
            total_members: queries::count_members(&self.pool, Some(true)).await?,
            total_savings: queries::sum_member_savings(&self.pool).await?,
            total_loans: queries::sum_outstanding_loans(&self.pool).await?,
            active_proposals: queries::count_proposals(&self.pool, ProposalStatus::Active).await?,
            contract_balance,
            pending_members: queries::count_members(&self.pool, Some(false)).await?,
            approved_loans: queries::count_loans(&self.pool, Some(LoanStatus::Approved)).await?,
            completed_loans: queries::count_loans(&self.pool, Some(LoanStatus::Repaid)).await?,
        })
    }

    pub async fn admin_logs(&self, limit: i64) -> Result<Vec<AdminLog>> {
        Ok(queries::list_admin_logs(&self.pool, limit.clamp(1, MAX_PAGE_SIZE)).await?)
    }

    pub async fn contract_transactions(&self, limit: i64) -> Result<Vec<ContractTransaction>> {
        Ok(queries::list_contract_transactions(&self.pool, limit.clamp(1, MAX_PAGE_SIZE)).await?)
    }

    pub async fn deploy_contract(&self, admin: &Member, ip_address: Option<&str>) -> Result<DeploymentInfo> {
        let deployment = self.contract.deploy(&admin.wallet_address).await?;
        queries::replace_deployment(&self.pool, &deployment).await?;
        queries::insert_admin_log(
            &self.pool,
            "CONTRACT_DEPLOY",
            &format!("Contract deployed at {}", deployment.address),
            admin.id,
            ip_address,
            deployment.deployed_at,
        )
        .await?;

        tracing::info!(address = %deployment.address, admin = %admin.wallet_address, "contract deployed");
        Ok(DeploymentInfo {
            explorer_url: deployment.explorer_url(&self.config.explorer_url),
            address: deployment.address,
            admin: deployment.admin,
            deployed_at: deployment.deployed_at,
        })
    }

    pub async fn current_deployment(&self) -> Result<Option<DeploymentInfo>> {
        let deployment = queries::get_current_deployment(&self.pool).await?;
        Ok(deployment.map(|d| DeploymentInfo {
            explorer_url: d.explorer_url(&self.config.explorer_url),
            address: d.address,
            admin: d.admin,
            deployed_at: d.deployed_at,
        }))
    }

    pub async fn clear_deployment(&self, admin: &Member, ip_address: Option<&str>) -> Result<bool> {
        let cleared = queries::clear_deployments(&self.pool).await?;
        if cleared {
            queries::insert_admin_log(
                &self.pool,
                "CONTRACT_CLEAR",
                "Deployment record cleared",
                admin.id,
                ip_address,
                Utc::now(),
            )
            .await?;
            tracing::info!(admin_id = admin.id, "deployment cleared");
        }
        Ok(cleared)
    }
}
