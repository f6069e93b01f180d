use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::SaccoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SavingKind {
    Deposit,
    Withdrawal,
}

impl SavingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
        }
    }
}

impl FromStr for SavingKind {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            other => Err(SaccoError::internal(format!("unknown saving kind {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Saving {
    pub id: i64,
    pub member_id: i64,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub kind: SavingKind,
    pub transaction_hash: String,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
}
