use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTransaction {
    pub id: i64,
    pub call_name: String,
    pub sender: String,
    pub member_id: Option<i64>,
    pub amount: Option<Decimal>,
    pub transaction_hash: String,
    pub block_number: i64,
    pub created_at: DateTime<Utc>,
}
