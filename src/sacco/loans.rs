use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use super::{add_amounts, require_good_standing, require_member, require_positive, Sacco};
use crate::contract::ContractCall;
use crate::database::db::queries;
use crate::database::models::loan::total_due;
use crate::database::models::{Loan, LoanStatus, Member, NewLoan, SavingKind};
use crate::error::{Result, SaccoError};

const MAX_QUOTE_MONTHS: u32 = 1200;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplication {
    pub amount: Decimal,
    #[serde(alias = "duration")]
    pub duration_months: i64,
    #[serde(default)]
    pub purpose: String,
    pub interest_rate_bps: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanAction {
    Approve,
    Reject,
    Disburse,
}

impl FromStr for LoanAction {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "approve" => Ok(Self::Approve),
            "reject" => Ok(Self::Reject),
            "disburse" => Ok(Self::Disburse),
            _ => Err(SaccoError::validation("Invalid request parameters")),
        }
    }
}

impl LoanAction {
    fn target(&self) -> LoanStatus {
        match self {
            Self::Approve => LoanStatus::Approved,
            Self::Reject => LoanStatus::Rejected,
            Self::Disburse => LoanStatus::Disbursed,
        }
    }

    fn log_action(&self) -> &'static str {
        match self {
            Self::Approve => "LOAN_APPROVE",
            Self::Reject => "LOAN_REJECT",
            Self::Disburse => "LOAN_DISBURSE",
        }
    }
}

/// A loan together with its repayment figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanView {
    #[serde(flatten)]
    pub loan: Loan,
    pub total_due: Decimal,
    pub outstanding: Decimal,
}

impl TryFrom<Loan> for LoanView {
    type Error = SaccoError;

    fn try_from(loan: Loan) -> Result<Self> {
        Ok(Self {
            total_due: loan.total_due()?,
            outstanding: loan.outstanding()?,
            loan,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    pub amount: Decimal,
    pub interest_rate_bps: i64,
    pub duration_months: u32,
    pub simple_interest: Decimal,
    pub total_due: Decimal,
    pub projected_compound_interest: Decimal,
}

/// `principal * (1 + r/12)^months - principal`, rounded to cents.
/// `None` when the figures overflow.
pub fn compound_interest(principal: Decimal, annual_rate_pct: Decimal, months: u32) -> Option<Decimal> {
    let monthly_rate = annual_rate_pct / Decimal::from(100) / Decimal::from(12);
    let step = Decimal::ONE + monthly_rate;

    let mut factor = Decimal::ONE;
    for _ in 0..months {
        factor = factor.checked_mul(step)?;
    }
    let total = principal.checked_mul(factor)?;
    Some((total - principal).round_dp(2))
}

pub fn quote(amount: Decimal, interest_rate_bps: i64, duration_months: u32) -> Result<LoanQuote> {
    require_positive(amount, "loan")?;
    validate_rate(interest_rate_bps)?;
    if duration_months == 0 || duration_months > MAX_QUOTE_MONTHS {
        return Err(SaccoError::validation("Please enter a valid duration"));
    }

    let annual_pct = Decimal::from(interest_rate_bps) / Decimal::from(100);
    let projected = compound_interest(amount, annual_pct, duration_months)
        .ok_or_else(|| SaccoError::validation("Loan figures are too large to quote"))?;
    let due = total_due(amount, interest_rate_bps)
        .ok_or_else(|| SaccoError::validation("Loan figures are too large to quote"))?;

    Ok(LoanQuote {
        amount,
        interest_rate_bps,
        duration_months,
        simple_interest: due - amount,
        total_due: due,
        projected_compound_interest: projected,
    })
}

fn validate_rate(interest_rate_bps: i64) -> Result<()> {
    if !(0..=10_000).contains(&interest_rate_bps) {
        return Err(SaccoError::validation(
            "Interest rate must be between 0 and 10000 basis points",
        ));
    }
    Ok(())
}

/// Deposits - withdrawals - disbursed principal + repayments.
pub(crate) async fn fund_balance(conn: &mut SqliteConnection) -> Result<Decimal> {
    let deposits = queries::sum_savings_by_kind(&mut *conn, SavingKind::Deposit).await?;
    let withdrawals = queries::sum_savings_by_kind(&mut *conn, SavingKind::Withdrawal).await?;
    let disbursed = queries::sum_disbursed_principal(&mut *conn).await?;
    let repaid = queries::sum_repayments(&mut *conn).await?;
    deposits
        .checked_sub(withdrawals)
        .and_then(|v| v.checked_sub(disbursed))
        .and_then(|v| v.checked_add(repaid))
        .ok_or_else(|| SaccoError::internal("fund balance overflows"))
}

async fn require_loan(conn: &mut SqliteConnection, loan_id: i64) -> Result<Loan> {
    queries::get_loan(conn, loan_id)
        .await?
        .ok_or_else(|| SaccoError::not_found(format!("Loan {loan_id} not found")))
}

impl Sacco {
    pub async fn apply_for_loan(&self, member: &Member, application: LoanApplication) -> Result<Loan> {
        require_good_standing(member)?;
        require_positive(application.amount, "loan")?;
        if application.duration_months <= 0 {
            return Err(SaccoError::validation("Please enter valid amount and duration"));
        }
        let purpose = application.purpose.trim().to_string();
        if purpose.is_empty() {
            return Err(SaccoError::validation("Please describe the purpose of the loan"));
        }
        let interest_rate_bps = application
            .interest_rate_bps
            .unwrap_or(self.config.default_interest_bps);
        validate_rate(interest_rate_bps)?;
        if total_due(application.amount, interest_rate_bps).is_none() {
            return Err(SaccoError::validation("Loan amount is too large"));
        }

        let minimum = self.config.minimum_savings;
        if member.total_savings < minimum {
            return Err(SaccoError::invalid_state(format!(
                "You need at least {minimum} in savings to be eligible for a loan"
            )));
        }

        let submitted = self
            .submit(
                &member.wallet_address,
                ContractCall::RequestLoan {
                    amount: application.amount,
                    interest_rate_bps,
                    duration_months: application.duration_months,
                    purpose: purpose.clone(),
                },
            )
            .await?;

        let new_loan = NewLoan {
            member_id: member.id,
            amount: application.amount,
            interest_rate_bps,
            duration_months: application.duration_months,
            purpose,
            transaction_hash: submitted.receipt.transaction_hash.clone(),
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let loan = queries::insert_loan(&mut *tx, &new_loan, now).await?;
        Self::record(&mut tx, &submitted, &member.wallet_address, Some(member.id), now).await?;
        tx.commit().await?;

        tracing::info!(loan_id = loan.id, member_id = member.id, amount = %loan.amount, "loan application submitted");
        Ok(loan)
    }

    pub async fn member_loans(&self, member_id: i64) -> Result<Vec<Loan>> {
        Ok(queries::list_loans_by_member(&self.pool, member_id).await?)
    }

    pub async fn all_loans(&self, status: Option<LoanStatus>) -> Result<Vec<Loan>> {
        Ok(queries::list_loans(&self.pool, status).await?)
    }

    pub async fn loan(&self, loan_id: i64) -> Result<Loan> {
        let mut conn = self.pool.acquire().await?;
        require_loan(&mut conn, loan_id).await
    }

    /// Approve, reject or disburse a loan on behalf of an administrator.
    pub async fn review_loan(
        &self,
        admin: &Member,
        loan_id: i64,
        action: LoanAction,
        ip_address: Option<&str>,
    ) -> Result<Loan> {
        let loan = self.loan(loan_id).await?;
        let target = action.target();
        if !loan.status.can_become(target) {
            return Err(SaccoError::invalid_state(format!(
                "Loan {} is {} and cannot be moved to {}",
                loan.id,
                loan.status.as_str(),
                target.as_str()
            )));
        }

        if action == LoanAction::Disburse {
            let mut conn = self.pool.acquire().await?;
            let available = fund_balance(&mut conn).await?;
            if loan.amount > available {
                return Err(SaccoError::invalid_state(format!(
                    "Insufficient SACCO funds: {available} available"
                )));
            }
        }

        let call = match action {
            LoanAction::Approve => Some(ContractCall::ApproveLoan { loan_id }),
            LoanAction::Disburse => Some(ContractCall::DisburseLoan { loan_id }),
            LoanAction::Reject => None,
        };
        let submitted = match call {
            Some(call) => Some(self.submit(&admin.wallet_address, call).await?),
            None => None,
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let current = require_loan(&mut tx, loan_id).await?;
        if current.status != loan.status {
            return Err(SaccoError::conflict(format!(
                "Loan {loan_id} changed while the request was processed"
            )));
        }
        if action == LoanAction::Disburse {
            // another disbursement may have drawn on the fund since the first check
            let available = fund_balance(&mut tx).await?;
            if current.amount > available {
                return Err(SaccoError::conflict(format!(
                    "Insufficient SACCO funds: {available} available"
                )));
            }
        }
        queries::update_loan_status(&mut *tx, loan_id, target, now).await?;

        if action == LoanAction::Disburse {
            let borrower = require_member(&mut tx, current.member_id).await?;
            let outstanding = add_amounts(borrower.total_loans_amount, current.amount)?;
            queries::set_member_totals(&mut *tx, borrower.id, borrower.total_savings, outstanding).await?;
        }
        if let Some(submitted) = &submitted {
            Self::record(&mut tx, submitted, &admin.wallet_address, Some(current.member_id), now).await?;
        }
        queries::insert_admin_log(
            &mut *tx,
            action.log_action(),
            &format!("Loan ID: {loan_id}"),
            admin.id,
            ip_address,
            now,
        )
        .await?;
        let updated = require_loan(&mut tx, loan_id).await?;
        tx.commit().await?;

        tracing::info!(loan_id, admin_id = admin.id, status = updated.status.as_str(), "loan reviewed");
        Ok(updated)
    }

    pub async fn repay_loan(&self, member: &Member, loan_id: i64, amount: Decimal) -> Result<Loan> {
        require_positive(amount, "repayment")?;
        let loan = self.loan(loan_id).await?;
        if loan.member_id != member.id {
            return Err(SaccoError::forbidden("You can only repay your own loans"));
        }
        if loan.status != LoanStatus::Disbursed {
            return Err(SaccoError::invalid_state(format!(
                "Loan {} is {} and cannot be repaid",
                loan.id,
                loan.status.as_str()
            )));
        }
        let outstanding = loan.outstanding()?;
        if amount > outstanding {
            return Err(SaccoError::conflict(format!(
                "Repayment exceeds the outstanding balance of {outstanding}"
            )));
        }

        let submitted = self
            .submit(&member.wallet_address, ContractCall::RepayLoan { loan_id, amount })
            .await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let current = require_loan(&mut tx, loan_id).await?;
        if current.status != LoanStatus::Disbursed || amount > current.outstanding()? {
            return Err(SaccoError::conflict(format!(
                "Loan {loan_id} changed while the repayment was processed"
            )));
        }
        let total_repaid = add_amounts(current.total_repaid, amount)?;
        queries::set_loan_total_repaid(&mut *tx, loan_id, total_repaid).await?;

        if total_repaid >= current.total_due()? {
            queries::update_loan_status(&mut *tx, loan_id, LoanStatus::Repaid, now).await?;
            let borrower = require_member(&mut tx, member.id).await?;
            let remaining = (borrower.total_loans_amount - current.amount).max(Decimal::ZERO);
            queries::set_member_totals(&mut *tx, member.id, borrower.total_savings, remaining).await?;
            tracing::info!(loan_id, member_id = member.id, "loan fully repaid");
        }
        Self::record(&mut tx, &submitted, &member.wallet_address, Some(member.id), now).await?;
        let updated = require_loan(&mut tx, loan_id).await?;
        tx.commit().await?;

        Ok(updated)
    }
}
