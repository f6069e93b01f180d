use chrono::Utc;
use rust_decimal::Decimal;
use serde::Serialize;

use super::{add_amounts, require_good_standing, require_member, require_positive, Sacco};
use crate::contract::ContractCall;
use crate::database::db::queries;
use crate::database::models::{Member, Saving, SavingKind};
use crate::error::{Result, SaccoError};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavingsHistory {
    pub member_id: i64,
    pub savings: Vec<Saving>,
    pub total_savings: Decimal,
}

impl Sacco {
    pub async fn deposit_savings(&self, member: &Member, amount: Decimal) -> Result<Saving> {
        require_good_standing(member)?;
        require_positive(amount, "deposit")?;

        let submitted = self
            .submit(&member.wallet_address, ContractCall::DepositSavings { amount })
            .await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let current = require_member(&mut tx, member.id).await?;
        let total_savings = add_amounts(current.total_savings, amount)?;
        let saving = queries::insert_saving(
            &mut *tx,
            member.id,
            amount,
            SavingKind::Deposit,
            &submitted.receipt.transaction_hash,
            now,
        )
        .await?;
        queries::set_member_totals(
            &mut *tx,
            member.id,
            total_savings,
            current.total_loans_amount,
        )
        .await?;
        Self::record(&mut tx, &submitted, &member.wallet_address, Some(member.id), now).await?;
        tx.commit().await?;

        tracing::info!(member_id = member.id, %amount, "savings deposited");
        Ok(saving)
    }

    pub async fn withdraw_savings(&self, member: &Member, amount: Decimal) -> Result<Saving> {
        require_good_standing(member)?;
        require_positive(amount, "withdrawal")?;
        if amount > member.total_savings {
            return Err(SaccoError::conflict("Insufficient savings balance"));
        }

        let submitted = self
            .submit(&member.wallet_address, ContractCall::WithdrawSavings { amount })
            .await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        // the balance may have moved while the contract call was in flight
        let current = require_member(&mut tx, member.id).await?;
        if amount > current.total_savings {
            tracing::warn!(member_id = member.id, %amount, "withdrawal raced a concurrent change");
            return Err(SaccoError::conflict("Insufficient savings balance"));
        }
        let saving = queries::insert_saving(
            &mut *tx,
            member.id,
            amount,
            SavingKind::Withdrawal,
            &submitted.receipt.transaction_hash,
            now,
        )
        .await?;
        queries::set_member_totals(
            &mut *tx,
            member.id,
            current.total_savings - amount,
            current.total_loans_amount,
        )
        .await?;
        Self::record(&mut tx, &submitted, &member.wallet_address, Some(member.id), now).await?;
        tx.commit().await?;

        tracing::info!(member_id = member.id, %amount, "savings withdrawn");
        Ok(saving)
    }

    pub async fn savings_history(&self, member_id: i64) -> Result<SavingsHistory> {
        let member = self.member_by_id(member_id).await?;
        let savings = queries::list_savings_by_member(&self.pool, member_id).await?;
        Ok(SavingsHistory {
            member_id,
            savings,
            total_savings: member.total_savings,
        })
    }
}
