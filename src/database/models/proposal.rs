use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SaccoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    Active,
    Passed,
    Rejected,
    Expired,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passed => "passed",
            Self::Rejected => "rejected",
            Self::Expired => "expired",
        }
    }
}

impl FromStr for ProposalStatus {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "passed" => Ok(Self::Passed),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            other => Err(SaccoError::internal(format!("unknown proposal status {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Proposal {
    pub id: i64,
    pub proposer_id: i64,
    pub proposer: String,
    pub title: String,
    pub description: String,
    pub yes_votes: i64,
    pub no_votes: i64,
    pub status: ProposalStatus,
    pub executed: bool,
    pub transaction_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Proposal {
    pub fn total_votes(&self) -> i64 {
        self.yes_votes + self.no_votes
    }

    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        self.status == ProposalStatus::Active && now < self.expires_at
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub proposal_id: i64,
    pub member_id: i64,
    pub support: bool,
    pub cast_at: DateTime<Utc>,
}
