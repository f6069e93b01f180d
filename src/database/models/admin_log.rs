use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AdminLog {
    #[sqlx(rename = "log_id")]
    pub id: i64,
    pub action: String,
    pub details: String,
    pub admin_id: i64,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}
