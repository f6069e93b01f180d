//! Contract-interaction layer.
//!
//! Every state-changing SACCO action is submitted to a [`SaccoContract`]
//! before it is recorded in the database. The only implementation today is
//! [`MockSaccoContract`], which stands in for the on-chain contract until a
//! real chain client is wired in.

mod mock;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::database::models::{Deployment, WalletAddress};

pub use mock::MockSaccoContract;

#[derive(Debug, Error)]
pub enum ContractError {
    #[error("contract rejected {method}: {reason}")]
    Rejected { method: &'static str, reason: String },

    #[error("contract unavailable: {0}")]
    Unavailable(String),
}

/// Receipt returned for a submitted contract call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    pub transaction_hash: String,
    pub block_number: u64,
}

/// A write call against the SACCO contract.
#[derive(Debug, Clone, PartialEq)]
pub enum ContractCall {
    RegisterMember { name: String, email: String },
    DepositSavings { amount: Decimal },
    WithdrawSavings { amount: Decimal },
    RequestLoan {
        amount: Decimal,
        interest_rate_bps: i64,
        duration_months: i64,
        purpose: String,
    },
    RepayLoan { loan_id: i64, amount: Decimal },
    CreateProposal { title: String, description: String },
    Vote { proposal_id: i64, support: bool },
    ApproveMember { member: WalletAddress },
    ApproveLoan { loan_id: i64 },
    DisburseLoan { loan_id: i64 },
    ExecuteProposal { proposal_id: i64 },
}

impl ContractCall {
    /// Contract method name.
    pub fn method(&self) -> &'static str {
        match self {
            Self::RegisterMember { .. } => "registerMember",
            Self::DepositSavings { .. } => "depositSavings",
            Self::WithdrawSavings { .. } => "withdrawSavings",
            Self::RequestLoan { .. } => "requestLoan",
            Self::RepayLoan { .. } => "repayLoan",
            Self::CreateProposal { .. } => "createProposal",
            Self::Vote { .. } => "vote",
            Self::ApproveMember { .. } => "approveMember",
            Self::ApproveLoan { .. } => "approveLoan",
            Self::DisburseLoan { .. } => "disburseLoan",
            Self::ExecuteProposal { .. } => "executeProposal",
        }
    }

    /// Value moved by the call, if any.
    pub fn amount(&self) -> Option<Decimal> {
        match self {
            Self::DepositSavings { amount }
            | Self::WithdrawSavings { amount }
            | Self::RequestLoan { amount, .. }
            | Self::RepayLoan { amount, .. } => Some(*amount),
            _ => None,
        }
    }
}

#[async_trait]
pub trait SaccoContract: Send + Sync {
    async fn submit(&self, sender: &WalletAddress, call: ContractCall) -> Result<TxReceipt, ContractError>;

    async fn deploy(&self, admin: &WalletAddress) -> Result<Deployment, ContractError>;
}
