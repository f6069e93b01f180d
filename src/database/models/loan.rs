use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SaccoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    Pending,
    Approved,
    Rejected,
    Disbursed,
    Repaid,
}

impl LoanStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Disbursed => "disbursed",
            Self::Repaid => "repaid",
        }
    }

    /// Statuses reachable from `self` through an admin or repayment action.
    pub fn can_become(&self, next: LoanStatus) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Approved)
                | (Self::Pending, Self::Rejected)
                | (Self::Approved, Self::Disbursed)
                | (Self::Disbursed, Self::Repaid)
        )
    }
}

impl FromStr for LoanStatus {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "disbursed" => Ok(Self::Disbursed),
            "repaid" => Ok(Self::Repaid),
            other => Err(SaccoError::validation(format!("Unknown loan status: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: i64,
    pub member_id: i64,
    pub amount: Decimal,
    pub interest_rate_bps: i64,
    pub duration_months: i64,
    pub purpose: String,
    pub status: LoanStatus,
    pub total_repaid: Decimal,
    pub transaction_hash: String,
    pub applied_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub disbursed_at: Option<DateTime<Utc>>,
    pub repaid_at: Option<DateTime<Utc>>,
}

impl Loan {
    /// Principal plus simple interest over the whole term.
    pub fn total_due(&self) -> Result<Decimal, SaccoError> {
        total_due(self.amount, self.interest_rate_bps)
            .ok_or_else(|| SaccoError::internal(format!("loan {} total due overflows", self.id)))
    }

    pub fn outstanding(&self) -> Result<Decimal, SaccoError> {
        let due = self.total_due()?;
        let left = due
            .checked_sub(self.total_repaid)
            .ok_or_else(|| SaccoError::internal(format!("loan {} balance overflows", self.id)))?;
        Ok(left.max(Decimal::ZERO))
    }
}

/// `None` when the figures overflow.
pub fn total_due(amount: Decimal, interest_rate_bps: i64) -> Option<Decimal> {
    let interest = amount
        .checked_mul(Decimal::from(interest_rate_bps))?
        .checked_div(Decimal::from(10_000))?;
    amount.checked_add(interest)
}

#[derive(Debug, Clone)]
pub struct NewLoan {
    pub member_id: i64,
    pub amount: Decimal,
    pub interest_rate_bps: i64,
    pub duration_months: i64,
    pub purpose: String,
    pub transaction_hash: String,
}
