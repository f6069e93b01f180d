use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{is_unique_violation, Sacco};
use crate::contract::{ContractCall, TxReceipt};
use crate::database::db::queries;
use crate::database::models::{Member, NewMember, WalletAddress};
use crate::error::{Result, SaccoError};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub phone: Option<String>,
    pub national_id: Option<String>,
    #[serde(default)]
    pub wallet_address: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberData {
    pub name: String,
    pub email: String,
    pub is_approved: bool,
    pub total_savings: Decimal,
    pub total_loans_amount: Decimal,
    /// Unix seconds
    pub registration_date: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberStatus {
    pub is_member: bool,
    pub is_approved: bool,
    pub member_data: Option<MemberData>,
}

impl From<&Member> for MemberData {
    fn from(member: &Member) -> Self {
        Self {
            name: member.name.clone(),
            email: member.email.clone(),
            is_approved: member.is_approved,
            total_savings: member.total_savings,
            total_loans_amount: member.total_loans_amount,
            registration_date: member.registered_at.timestamp(),
        }
    }
}

/// `local@domain.tld` with no whitespace.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && domain
            .char_indices()
            .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Address-derived stand-in status used when the demo fallback is enabled:
/// an even last hex digit means registered, a multiple of three means approved.
pub fn demo_member_status(address: &WalletAddress, now: DateTime<Utc>) -> MemberStatus {
    let last_digit = address
        .as_str()
        .chars()
        .last()
        .and_then(|c| c.to_digit(16))
        .unwrap_or(1);
    let registered = last_digit % 2 == 0;
    let approved = registered && last_digit % 3 == 0;

    MemberStatus {
        is_member: registered,
        is_approved: approved,
        member_data: registered.then(|| MemberData {
            name: "Sample User".to_string(),
            email: format!("user_{}@example.com", &address.as_str()[..6]),
            is_approved: approved,
            total_savings: Decimal::from(1000),
            total_loans_amount: Decimal::ZERO,
            registration_date: now.timestamp(),
        }),
    }
}

impl Sacco {
    pub async fn register_member(&self, registration: Registration) -> Result<(Member, TxReceipt)> {
        let name = registration.name.trim().to_string();
        let email = registration.email.trim().to_string();
        let wallet_raw = registration.wallet_address.trim();

        if name.is_empty() || email.is_empty() || wallet_raw.is_empty() {
            return Err(SaccoError::validation(
                "Name, email, and wallet address are required",
            ));
        }
        if !is_valid_email(&email) {
            return Err(SaccoError::validation("Please enter a valid email address"));
        }
        let wallet = WalletAddress::parse(wallet_raw)?;

        if queries::get_member_by_wallet(&self.pool, &wallet).await?.is_some() {
            return Err(SaccoError::conflict("This wallet address is already registered"));
        }

        let submitted = self
            .submit(
                &wallet,
                ContractCall::RegisterMember {
                    name: name.clone(),
                    email: email.clone(),
                },
            )
            .await?;

        let new_member = NewMember {
            wallet_address: wallet.clone(),
            name,
            email,
            phone: non_empty(registration.phone),
            national_id: non_empty(registration.national_id),
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let member_id = match queries::insert_member(&mut *tx, &new_member, now).await {
            Ok(id) => id,
            Err(err) if is_unique_violation(&err) => {
                return Err(SaccoError::conflict("This wallet address is already registered"));
            }
            Err(err) => return Err(err.into()),
        };
        Self::record(&mut tx, &submitted, &wallet, Some(member_id), now).await?;
        let member = super::require_member(&mut tx, member_id).await?;
        tx.commit().await?;

        tracing::info!(member_id, wallet = %wallet.shortened(), "member registered, awaiting approval");
        Ok((member, submitted.receipt))
    }

    pub async fn member_status(&self, address: &str) -> Result<MemberStatus> {
        let wallet = WalletAddress::parse(address)?;

        if let Some(member) = queries::get_member_by_wallet(&self.pool, &wallet).await? {
            return Ok(MemberStatus {
                is_member: true,
                is_approved: member.is_approved,
                member_data: Some(MemberData::from(&member)),
            });
        }

        if self.config.demo_fallback {
            tracing::debug!(%wallet, "member not found, answering with demo status");
            return Ok(demo_member_status(&wallet, Utc::now()));
        }

        Ok(MemberStatus {
            is_member: false,
            is_approved: false,
            member_data: None,
        })
    }

    pub async fn member_by_wallet(&self, wallet: &WalletAddress) -> Result<Option<Member>> {
        Ok(queries::get_member_by_wallet(&self.pool, wallet).await?)
    }

    pub async fn member_by_id(&self, member_id: i64) -> Result<Member> {
        let mut conn = self.pool.acquire().await?;
        super::require_member(&mut conn, member_id).await
    }
}
