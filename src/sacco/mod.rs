//! SACCO business rules.
//!
//! [`Sacco`] owns the database pool and the contract client. Each operation
//! validates its input against current state, submits the matching contract
//! call, then records the outcome (and the contract receipt) in a single SQL
//! transaction.

pub mod admin;
pub mod governance;
pub mod loans;
pub mod members;
pub mod savings;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::config::AppConfig;
use crate::contract::{ContractCall, SaccoContract, TxReceipt};
use crate::database::db::queries;
use crate::database::models::{Member, WalletAddress};
use crate::error::{Result, SaccoError};

#[derive(Clone)]
pub struct Sacco {
    pool: Pool<Sqlite>,
    contract: Arc<dyn SaccoContract>,
    config: Arc<AppConfig>,
}

/// A confirmed contract call that still has to be written to the ledger.
#[derive(Debug, Clone)]
pub(crate) struct Submitted {
    method: &'static str,
    amount: Option<Decimal>,
    receipt: TxReceipt,
}

impl Sacco {
    pub fn new(pool: Pool<Sqlite>, contract: Arc<dyn SaccoContract>, config: AppConfig) -> Self {
        Self {
            pool,
            contract,
            config: Arc::new(config),
        }
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub(crate) async fn submit(&self, sender: &WalletAddress, call: ContractCall) -> Result<Submitted> {
        let method = call.method();
        let amount = call.amount();
        let receipt = self.contract.submit(sender, call).await?;
        Ok(Submitted { method, amount, receipt })
    }

    pub(crate) async fn record(
        conn: &mut SqliteConnection,
        submitted: &Submitted,
        sender: &WalletAddress,
        member_id: Option<i64>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        queries::insert_contract_transaction(
            conn,
            submitted.method,
            sender,
            member_id,
            submitted.amount,
            &submitted.receipt,
            at,
        )
        .await?;
        Ok(())
    }

    /// Seeds (or promotes) the configured bootstrap administrator.
    pub async fn ensure_bootstrap_admin(&self) -> Result<Option<i64>> {
        let Some(wallet) = self.config.bootstrap_admin.clone() else {
            return Ok(None);
        };
        let id = self.grant_super_admin(&wallet).await?;
        Ok(Some(id))
    }

    pub async fn grant_super_admin(&self, wallet: &WalletAddress) -> Result<i64> {
        let id = queries::upsert_super_admin(&self.pool, wallet, Utc::now()).await?;
        tracing::info!(%wallet, member_id = id, "super admin granted");
        Ok(id)
    }
}

/// Loads a member or fails with 404.
pub(crate) async fn require_member(conn: &mut SqliteConnection, member_id: i64) -> Result<Member> {
    queries::get_member_by_id(conn, member_id)
        .await?
        .ok_or_else(|| SaccoError::not_found(format!("Member {member_id} not found")))
}

/// Largest amount a single deposit, withdrawal, loan or repayment may carry.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_000_000_000, 0, 0, false, 0);

pub(crate) fn require_positive(amount: Decimal, what: &str) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(SaccoError::validation(format!("Please enter a valid {what} amount")));
    }
    if amount > MAX_AMOUNT {
        return Err(SaccoError::validation(format!(
            "The {what} amount may not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Checked `a + b` for running totals.
pub(crate) fn add_amounts(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b)
        .ok_or_else(|| SaccoError::validation("Amount exceeds the supported range"))
}

pub(crate) fn require_good_standing(member: &Member) -> Result<()> {
    if !member.is_approved {
        return Err(SaccoError::forbidden("Membership approval is required"));
    }
    if !member.is_active {
        return Err(SaccoError::forbidden("Membership is deactivated"));
    }
    Ok(())
}

pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}
