use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    #[sqlx(rename = "contract_address")]
    pub address: String,
    #[sqlx(rename = "admin_address")]
    pub admin: String,
    pub deployed_at: DateTime<Utc>,
}

impl Deployment {
    pub fn explorer_url(&self, explorer_base: &str) -> String {
        format!("{}/address/{}", explorer_base.trim_end_matches('/'), self.address)
    }
}
