use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;

use super::{is_unique_violation, require_good_standing, Sacco};
use crate::contract::ContractCall;
use crate::database::db::queries;
use crate::database::models::{Member, Proposal, ProposalStatus};
use crate::error::{Result, SaccoError};

/// Which proposals a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProposalFilter {
    #[default]
    Active,
    Passed,
    Rejected,
    Expired,
    All,
}

impl ProposalFilter {
    fn status(&self) -> Option<ProposalStatus> {
        match self {
            Self::Active => Some(ProposalStatus::Active),
            Self::Passed => Some(ProposalStatus::Passed),
            Self::Rejected => Some(ProposalStatus::Rejected),
            Self::Expired => Some(ProposalStatus::Expired),
            Self::All => None,
        }
    }
}

impl FromStr for ProposalFilter {
    type Err = SaccoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "passed" | "past" => Ok(Self::Passed),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            "all" => Ok(Self::All),
            other => Err(SaccoError::validation(format!("Unknown proposal filter: {other}"))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVote {
    pub has_voted: bool,
    pub user_vote: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GovernanceStats {
    pub active_proposals: i64,
    pub passed_proposals: i64,
    pub rejected_proposals: i64,
    pub total_votes: i64,
    pub member_count: i64,
    pub average_participation: f64,
}

/// Votes needed for a proposal to count: `ceil(percent% * members)`, at least one.
pub fn quorum(approved_members: i64, quorum_percent: u32) -> i64 {
    let needed = (approved_members.max(0) * i64::from(quorum_percent) + 99) / 100;
    needed.max(1)
}

/// Final status of a proposal whose voting window has closed.
pub fn outcome(yes_votes: i64, no_votes: i64, quorum: i64) -> ProposalStatus {
    if yes_votes + no_votes < quorum {
        ProposalStatus::Expired
    } else if yes_votes > no_votes {
        ProposalStatus::Passed
    } else {
        ProposalStatus::Rejected
    }
}

pub fn average_participation(total_votes: i64, members: i64, proposals: i64) -> f64 {
    let possible = members * proposals;
    if possible <= 0 {
        return 0.0;
    }
    (total_votes as f64 / possible as f64).min(1.0)
}

async fn require_proposal(conn: &mut SqliteConnection, proposal_id: i64) -> Result<Proposal> {
    queries::get_proposal(conn, proposal_id)
        .await?
        .ok_or_else(|| SaccoError::not_found(format!("Proposal {proposal_id} not found")))
}

impl Sacco {
    pub async fn create_proposal(&self, member: &Member, title: &str, description: &str) -> Result<Proposal> {
        require_good_standing(member)?;
        let title = title.trim();
        let description = description.trim();
        if title.is_empty() || description.is_empty() {
            return Err(SaccoError::validation("Title and description are required"));
        }

        let submitted = self
            .submit(
                &member.wallet_address,
                ContractCall::CreateProposal {
                    title: title.to_string(),
                    description: description.to_string(),
                },
            )
            .await?;

        let now = Utc::now();
        let expires_at = now + self.config.voting_period;
        let mut tx = self.pool.begin().await?;
        let proposal_id = queries::insert_proposal(
            &mut *tx,
            member.id,
            title,
            description,
            &submitted.receipt.transaction_hash,
            now,
            expires_at,
        )
        .await?;
        Self::record(&mut tx, &submitted, &member.wallet_address, Some(member.id), now).await?;
        let proposal = require_proposal(&mut tx, proposal_id).await?;
        tx.commit().await?;

        tracing::info!(proposal_id, member_id = member.id, %expires_at, "proposal created");
        Ok(proposal)
    }

    /// Closes every active proposal whose voting window ended before `now`.
    pub async fn finalize_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let active = queries::list_proposals(&self.pool, Some(ProposalStatus::Active)).await?;
        let due: Vec<&Proposal> = active.iter().filter(|p| !p.is_open_at(now)).collect();
        if due.is_empty() {
            return Ok(0);
        }

        let members = queries::count_members(&self.pool, Some(true)).await?;
        let needed = quorum(members, self.config.quorum_percent);

        let mut tx = self.pool.begin().await?;
        for proposal in &due {
            let status = outcome(proposal.yes_votes, proposal.no_votes, needed);
            queries::set_proposal_status(&mut *tx, proposal.id, status).await?;
            tracing::info!(
                proposal_id = proposal.id,
                yes = proposal.yes_votes,
                no = proposal.no_votes,
                quorum = needed,
                status = status.as_str(),
                "proposal finalized"
            );
        }
        tx.commit().await?;
        Ok(due.len())
    }

    pub async fn list_proposals(&self, filter: ProposalFilter) -> Result<Vec<Proposal>> {
        self.finalize_expired(Utc::now()).await?;
        Ok(queries::list_proposals(&self.pool, filter.status()).await?)
    }

    pub async fn proposal(&self, proposal_id: i64) -> Result<Proposal> {
        let mut conn = self.pool.acquire().await?;
        require_proposal(&mut conn, proposal_id).await
    }

    pub async fn vote(&self, member: &Member, proposal_id: i64, support: bool) -> Result<Proposal> {
        require_good_standing(member)?;
        let proposal = self.proposal(proposal_id).await?;
        if !proposal.is_open_at(Utc::now()) {
            return Err(SaccoError::invalid_state("Voting has closed for this proposal"));
        }
        if queries::get_vote(&self.pool, proposal_id, member.id).await?.is_some() {
            return Err(SaccoError::conflict("You have already voted on this proposal"));
        }

        let submitted = self
            .submit(&member.wallet_address, ContractCall::Vote { proposal_id, support })
            .await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let current = require_proposal(&mut tx, proposal_id).await?;
        if !current.is_open_at(now) {
            return Err(SaccoError::invalid_state("Voting has closed for this proposal"));
        }
        match queries::insert_vote(&mut *tx, proposal_id, member.id, support, now).await {
            Ok(()) => {}
            Err(err) if is_unique_violation(&err) => {
                return Err(SaccoError::conflict("You have already voted on this proposal"));
            }
            Err(err) => return Err(err.into()),
        }
        queries::increment_tally(&mut *tx, proposal_id, support).await?;
        Self::record(&mut tx, &submitted, &member.wallet_address, Some(member.id), now).await?;
        let updated = require_proposal(&mut tx, proposal_id).await?;
        tx.commit().await?;

        tracing::info!(proposal_id, member_id = member.id, support, "vote cast");
        Ok(updated)
    }

    pub async fn my_vote(&self, member: &Member, proposal_id: i64) -> Result<MyVote> {
        let vote = queries::get_vote(&self.pool, proposal_id, member.id).await?;
        Ok(MyVote {
            has_voted: vote.is_some(),
            user_vote: vote.map(|v| v.support),
        })
    }

    pub async fn execute_proposal(
        &self,
        admin: &Member,
        proposal_id: i64,
        ip_address: Option<&str>,
    ) -> Result<Proposal> {
        self.finalize_expired(Utc::now()).await?;
        let proposal = self.proposal(proposal_id).await?;
        if proposal.status != ProposalStatus::Passed {
            return Err(SaccoError::invalid_state(format!(
                "Only passed proposals can be executed (proposal is {})",
                proposal.status.as_str()
            )));
        }
        if proposal.executed {
            return Err(SaccoError::conflict("Proposal has already been executed"));
        }

        let submitted = self
            .submit(&admin.wallet_address, ContractCall::ExecuteProposal { proposal_id })
            .await?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        queries::mark_proposal_executed(&mut *tx, proposal_id).await?;
        Self::record(&mut tx, &submitted, &admin.wallet_address, Some(admin.id), now).await?;
        queries::insert_admin_log(
            &mut *tx,
            "PROPOSAL_EXECUTE",
            &format!("Proposal ID: {proposal_id}"),
            admin.id,
            ip_address,
            now,
        )
        .await?;
        let updated = require_proposal(&mut tx, proposal_id).await?;
        tx.commit().await?;

        tracing::info!(proposal_id, admin_id = admin.id, "proposal executed");
        Ok(updated)
    }

    pub async fn governance_stats(&self) -> Result<GovernanceStats> {
        self.finalize_expired(Utc::now()).await?;
        let active = queries::count_proposals(&self.pool, ProposalStatus::Active).await?;
        let passed = queries::count_proposals(&self.pool, ProposalStatus::Passed).await?;
        let rejected = queries::count_proposals(&self.pool, ProposalStatus::Rejected).await?;
        let expired = queries::count_proposals(&self.pool, ProposalStatus::Expired).await?;
        let total_votes = queries::count_votes(&self.pool).await?;
        let member_count = queries::count_members(&self.pool, Some(true)).await?;

        let proposals = active + passed + rejected + expired;
        Ok(GovernanceStats {
            active_proposals: active,
            passed_proposals: passed,
            rejected_proposals: rejected,
            total_votes,
            member_count,
            average_participation: average_participation(total_votes, member_count, proposals),
        })
    }
}
