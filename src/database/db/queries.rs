use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Executor, Pool, Row, Sqlite};

use crate::contract::TxReceipt;
use crate::database::models::{
    AdminLog, ContractTransaction, Deployment, Loan, LoanStatus, Member, MemberSummary, NewLoan,
    NewMember, Proposal, ProposalStatus, Role, Saving, SavingKind, Vote, WalletAddress,
};
/*
SQL for every SACCO table. Money is stored as decimal text and parsed
back into rust_decimal; business rules live in crate::sacco.
 */

fn decode_decimal(row: &SqliteRow, column: &str) -> Result<Decimal, sqlx::Error> {
    let text: String = row.try_get(column)?;
    Decimal::from_str(&text).map_err(|e| {
        sqlx::Error::Decode(format!("Invalid Decimal format for {}: {}", column, e).into())
    })
}

fn decode_enum<T: FromStr>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T::Err: std::fmt::Display,
{
    let text: String = row.try_get(column)?;
    text.parse::<T>()
        .map_err(|e| sqlx::Error::Decode(format!("Invalid value for {}: {}", column, e).into()))
}

fn sum_decimals(values: Vec<String>) -> Result<Decimal, sqlx::Error> {
    values.iter().try_fold(Decimal::ZERO, |acc, text| {
        let value = Decimal::from_str(text)
            .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format: {}", e).into()))?;
        acc.checked_add(value)
            .ok_or_else(|| sqlx::Error::Decode("Decimal sum overflowed".into()))
    })
}

/*==========Member Queries=========== */

const MEMBER_COLUMNS: &str = r#"
    member_id, wallet_address, name, email, phone, national_id,
    is_approved, is_active, role, total_savings, total_loans_amount, registered_at
"#;

fn member_from_row(row: &SqliteRow) -> Result<Member, sqlx::Error> {
    let wallet: String = row.try_get("wallet_address")?;
    Ok(Member {
        id: row.try_get("member_id")?,
        wallet_address: WalletAddress::parse(&wallet)
            .map_err(|e| sqlx::Error::Decode(format!("Invalid wallet address: {}", e).into()))?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        national_id: row.try_get("national_id")?,
        is_approved: row.try_get("is_approved")?,
        is_active: row.try_get("is_active")?,
        role: decode_enum(row, "role")?,
        total_savings: decode_decimal(row, "total_savings")?,
        total_loans_amount: decode_decimal(row, "total_loans_amount")?,
        registered_at: row.try_get("registered_at")?,
    })
}

// Create member (unapproved, active, zero balances)
pub async fn insert_member<'e, E>(
    exec: E,
    member: &NewMember,
    registered_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO members (wallet_address, name, email, phone, national_id, registered_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING member_id
        "#,
    )
    .bind(member.wallet_address.as_str())
    .bind(&member.name)
    .bind(&member.email)
    .bind(member.phone.as_deref())
    .bind(member.national_id.as_deref())
    .bind(registered_at)
    .fetch_one(exec)
    .await?;

    row.try_get("member_id")
}

pub async fn get_member_by_id<'e, E>(exec: E, member_id: i64) -> Result<Option<Member>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE member_id = ?");
    let row = sqlx::query(&sql)
        .bind(member_id)
        .fetch_optional(exec)
        .await?;
    row.as_ref().map(member_from_row).transpose()
}

pub async fn get_member_by_wallet<'e, E>(
    exec: E,
    wallet: &WalletAddress,
) -> Result<Option<Member>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {MEMBER_COLUMNS} FROM members WHERE wallet_address = ?");
    let row = sqlx::query(&sql)
        .bind(wallet.as_str())
        .fetch_optional(exec)
        .await?;
    row.as_ref().map(member_from_row).transpose()
}

pub async fn set_member_approved<'e, E>(exec: E, member_id: i64, approved: bool) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE members SET is_approved = ? WHERE member_id = ?")
        .bind(approved)
        .bind(member_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_member_active<'e, E>(exec: E, member_id: i64, active: bool) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE members SET is_active = ? WHERE member_id = ?")
        .bind(active)
        .bind(member_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_member_role<'e, E>(exec: E, member_id: i64, role: Role) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let result = sqlx::query("UPDATE members SET role = ? WHERE member_id = ?")
        .bind(role.as_str())
        .bind(member_id)
        .execute(exec)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn set_member_totals<'e, E>(
    exec: E,
    member_id: i64,
    total_savings: Decimal,
    total_loans_amount: Decimal,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        UPDATE members
        SET total_savings = ?, total_loans_amount = ?
        WHERE member_id = ?
        "#,
    )
    .bind(total_savings.to_string())
    .bind(total_loans_amount.to_string())
    .bind(member_id)
    .execute(exec)
    .await?;
    Ok(())
}

/// Creates or promotes `wallet` to an approved, active SUPER_ADMIN.
pub async fn upsert_super_admin(
    pool: &Pool<Sqlite>,
    wallet: &WalletAddress,
    now: DateTime<Utc>,
) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO members (wallet_address, name, email, is_approved, is_active, role, registered_at)
        VALUES (?, 'SACCO Administrator', '', 1, 1, 'SUPER_ADMIN', ?)
        ON CONFLICT (wallet_address) DO UPDATE
        SET is_approved = 1, is_active = 1, role = 'SUPER_ADMIN'
        RETURNING member_id
        "#,
    )
    .bind(wallet.as_str())
    .bind(now)
    .fetch_one(pool)
    .await?;

    row.try_get("member_id")
}

// approved: None = all members
pub async fn list_members(
    pool: &Pool<Sqlite>,
    approved: Option<bool>,
    limit: i64,
    offset: i64,
) -> Result<Vec<MemberSummary>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT
            m.member_id, m.wallet_address, m.name, m.email, m.is_approved,
            m.is_active, m.role, m.registered_at,
            (SELECT COUNT(*) FROM savings s WHERE s.member_id = m.member_id) AS savings_count,
            (SELECT COUNT(*) FROM loans l WHERE l.member_id = m.member_id) AS loans_count
        FROM members m
        WHERE (? IS NULL OR m.is_approved = ?)
        ORDER BY m.registered_at DESC, m.member_id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(approved)
    .bind(approved)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        let wallet: String = row.try_get("wallet_address")?;
        Ok(MemberSummary {
            id: row.try_get("member_id")?,
            wallet_address: WalletAddress::parse(&wallet)
                .map_err(|e| sqlx::Error::Decode(format!("Invalid wallet address: {}", e).into()))?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            is_approved: row.try_get("is_approved")?,
            is_active: row.try_get("is_active")?,
            role: decode_enum(row, "role")?,
            registered_at: row.try_get("registered_at")?,
            savings_count: row.try_get("savings_count")?,
            loans_count: row.try_get("loans_count")?,
        })
    })
    .collect()
}

pub async fn count_members(pool: &Pool<Sqlite>, approved: Option<bool>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM members WHERE (? IS NULL OR is_approved = ?)")
        .bind(approved)
        .bind(approved)
        .fetch_one(pool)
        .await
}

pub async fn sum_member_savings(pool: &Pool<Sqlite>) -> Result<Decimal, sqlx::Error> {
    let values: Vec<String> = sqlx::query_scalar("SELECT total_savings FROM members")
        .fetch_all(pool)
        .await?;
    sum_decimals(values)
}

pub async fn sum_outstanding_loans(pool: &Pool<Sqlite>) -> Result<Decimal, sqlx::Error> {
    let values: Vec<String> = sqlx::query_scalar("SELECT total_loans_amount FROM members")
        .fetch_all(pool)
        .await?;
    sum_decimals(values)
}

/*==========Savings Queries=========== */

fn saving_from_row(row: &SqliteRow) -> Result<Saving, sqlx::Error> {
    Ok(Saving {
        id: row.try_get("saving_id")?,
        member_id: row.try_get("member_id")?,
        amount: decode_decimal(row, "amount")?,
        kind: decode_enum(row, "kind")?,
        transaction_hash: row.try_get("transaction_hash")?,
        created_at: row.try_get("created_at")?,
    })
}

pub async fn insert_saving<'e, E>(
    exec: E,
    member_id: i64,
    amount: Decimal,
    kind: SavingKind,
    transaction_hash: &str,
    created_at: DateTime<Utc>,
) -> Result<Saving, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO savings (member_id, amount, kind, transaction_hash, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING saving_id, member_id, amount, kind, transaction_hash, created_at
        "#,
    )
    .bind(member_id)
    .bind(amount.to_string())
    .bind(kind.as_str())
    .bind(transaction_hash)
    .bind(created_at)
    .fetch_one(exec)
    .await?;

    saving_from_row(&row)
}

// Newest first
pub async fn list_savings_by_member(pool: &Pool<Sqlite>, member_id: i64) -> Result<Vec<Saving>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT saving_id, member_id, amount, kind, transaction_hash, created_at
        FROM savings
        WHERE member_id = ?
        ORDER BY created_at DESC, saving_id DESC
        "#,
    )
    .bind(member_id)
    .fetch_all(pool)
    .await?
    .iter()
    .map(saving_from_row)
    .collect()
}

pub async fn sum_savings_by_kind<'e, E>(exec: E, kind: SavingKind) -> Result<Decimal, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let values: Vec<String> = sqlx::query_scalar("SELECT amount FROM savings WHERE kind = ?")
        .bind(kind.as_str())
        .fetch_all(exec)
        .await?;
    sum_decimals(values)
}

/*==========Loan Queries=========== */

const LOAN_COLUMNS: &str = r#"
    loan_id, member_id, amount, interest_rate_bps, duration_months, purpose, status,
    total_repaid, transaction_hash, applied_at, approved_at, disbursed_at, repaid_at
"#;

fn loan_from_row(row: &SqliteRow) -> Result<Loan, sqlx::Error> {
    Ok(Loan {
        id: row.try_get("loan_id")?,
        member_id: row.try_get("member_id")?,
        amount: decode_decimal(row, "amount")?,
        interest_rate_bps: row.try_get("interest_rate_bps")?,
        duration_months: row.try_get("duration_months")?,
        purpose: row.try_get("purpose")?,
        status: decode_enum(row, "status")?,
        total_repaid: decode_decimal(row, "total_repaid")?,
        transaction_hash: row.try_get("transaction_hash")?,
        applied_at: row.try_get("applied_at")?,
        approved_at: row.try_get("approved_at")?,
        disbursed_at: row.try_get("disbursed_at")?,
        repaid_at: row.try_get("repaid_at")?,
    })
}

pub async fn insert_loan<'e, E>(exec: E, loan: &NewLoan, applied_at: DateTime<Utc>) -> Result<Loan, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!(
        r#"
        INSERT INTO loans (member_id, amount, interest_rate_bps, duration_months, purpose, transaction_hash, applied_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {LOAN_COLUMNS}
        "#
    );
    let row = sqlx::query(&sql)
        .bind(loan.member_id)
        .bind(loan.amount.to_string())
        .bind(loan.interest_rate_bps)
        .bind(loan.duration_months)
        .bind(&loan.purpose)
        .bind(&loan.transaction_hash)
        .bind(applied_at)
        .fetch_one(exec)
        .await?;

    loan_from_row(&row)
}

pub async fn get_loan<'e, E>(exec: E, loan_id: i64) -> Result<Option<Loan>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("SELECT {LOAN_COLUMNS} FROM loans WHERE loan_id = ?");
    let row = sqlx::query(&sql)
        .bind(loan_id)
        .fetch_optional(exec)
        .await?;
    row.as_ref().map(loan_from_row).transpose()
}

pub async fn list_loans_by_member(pool: &Pool<Sqlite>, member_id: i64) -> Result<Vec<Loan>, sqlx::Error> {
    let sql = format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE member_id = ? ORDER BY applied_at DESC, loan_id DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(member_id)
        .fetch_all(pool)
        .await?;
    rows.iter().map(loan_from_row).collect()
}

pub async fn list_loans(pool: &Pool<Sqlite>, status: Option<LoanStatus>) -> Result<Vec<Loan>, sqlx::Error> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "SELECT {LOAN_COLUMNS} FROM loans WHERE (? IS NULL OR status = ?) ORDER BY applied_at DESC, loan_id DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;
    rows.iter().map(loan_from_row).collect()
}

/// Moves a loan to `status` and stamps the matching timestamp column.
pub async fn update_loan_status<'e, E>(
    exec: E,
    loan_id: i64,
    status: LoanStatus,
    at: DateTime<Utc>,
) -> Result<bool, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let stamp_column = match status {
        LoanStatus::Approved => Some("approved_at"),
        LoanStatus::Disbursed => Some("disbursed_at"),
        LoanStatus::Repaid => Some("repaid_at"),
        LoanStatus::Pending | LoanStatus::Rejected => None,
    };

    let result = match stamp_column {
        Some(column) => {
            let sql = format!("UPDATE loans SET status = ?, {column} = ? WHERE loan_id = ?");
            let done = sqlx::query(&sql)
                .bind(status.as_str())
                .bind(at)
                .bind(loan_id)
                .execute(exec)
                .await?;
            done
        }
        None => {
            sqlx::query("UPDATE loans SET status = ? WHERE loan_id = ?")
                .bind(status.as_str())
                .bind(loan_id)
                .execute(exec)
                .await?
        }
    };
    Ok(result.rows_affected() > 0)
}

pub async fn set_loan_total_repaid<'e, E>(exec: E, loan_id: i64, total_repaid: Decimal) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE loans SET total_repaid = ? WHERE loan_id = ?")
        .bind(total_repaid.to_string())
        .bind(loan_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn count_loans(pool: &Pool<Sqlite>, status: Option<LoanStatus>) -> Result<i64, sqlx::Error> {
    let status = status.map(|s| s.as_str());
    sqlx::query_scalar("SELECT COUNT(*) FROM loans WHERE (? IS NULL OR status = ?)")
        .bind(status)
        .bind(status)
        .fetch_one(pool)
        .await
}

pub async fn sum_loan_amounts(pool: &Pool<Sqlite>) -> Result<Decimal, sqlx::Error> {
    let values: Vec<String> = sqlx::query_scalar("SELECT amount FROM loans")
        .fetch_all(pool)
        .await?;
    sum_decimals(values)
}

/// Principal that has left the fund (disbursed or since repaid).
pub async fn sum_disbursed_principal<'e, E>(exec: E) -> Result<Decimal, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let values: Vec<String> =
        sqlx::query_scalar("SELECT amount FROM loans WHERE status IN ('disbursed', 'repaid')")
            .fetch_all(exec)
            .await?;
    sum_decimals(values)
}

pub async fn sum_repayments<'e, E>(exec: E) -> Result<Decimal, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let values: Vec<String> = sqlx::query_scalar("SELECT total_repaid FROM loans")
        .fetch_all(exec)
        .await?;
    sum_decimals(values)
}

/*==========Governance Queries=========== */

const PROPOSAL_SELECT: &str = r#"
    SELECT
        p.proposal_id, p.proposer_id, m.wallet_address AS proposer, p.title, p.description,
        p.yes_votes, p.no_votes, p.status, p.executed, p.transaction_hash,
        p.created_at, p.expires_at
    FROM proposals p
    JOIN members m ON m.member_id = p.proposer_id
"#;

fn proposal_from_row(row: &SqliteRow) -> Result<Proposal, sqlx::Error> {
    Ok(Proposal {
        id: row.try_get("proposal_id")?,
        proposer_id: row.try_get("proposer_id")?,
        proposer: row.try_get("proposer")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        yes_votes: row.try_get("yes_votes")?,
        no_votes: row.try_get("no_votes")?,
        status: decode_enum(row, "status")?,
        executed: row.try_get("executed")?,
        transaction_hash: row.try_get("transaction_hash")?,
        created_at: row.try_get("created_at")?,
        expires_at: row.try_get("expires_at")?,
    })
}

pub async fn insert_proposal<'e, E>(
    exec: E,
    proposer_id: i64,
    title: &str,
    description: &str,
    transaction_hash: &str,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query(
        r#"
        INSERT INTO proposals (proposer_id, title, description, transaction_hash, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING proposal_id
        "#,
    )
    .bind(proposer_id)
    .bind(title)
    .bind(description)
    .bind(transaction_hash)
    .bind(created_at)
    .bind(expires_at)
    .fetch_one(exec)
    .await?;

    row.try_get("proposal_id")
}

pub async fn get_proposal<'e, E>(exec: E, proposal_id: i64) -> Result<Option<Proposal>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = format!("{PROPOSAL_SELECT} WHERE p.proposal_id = ?");
    let row = sqlx::query(&sql)
        .bind(proposal_id)
        .fetch_optional(exec)
        .await?;
    row.as_ref().map(proposal_from_row).transpose()
}

pub async fn list_proposals(
    pool: &Pool<Sqlite>,
    status: Option<ProposalStatus>,
) -> Result<Vec<Proposal>, sqlx::Error> {
    let status = status.map(|s| s.as_str());
    let sql = format!(
        "{PROPOSAL_SELECT} WHERE (? IS NULL OR p.status = ?) ORDER BY p.created_at DESC, p.proposal_id DESC"
    );
    let rows = sqlx::query(&sql)
        .bind(status)
        .bind(status)
        .fetch_all(pool)
        .await?;
    rows.iter().map(proposal_from_row).collect()
}

pub async fn set_proposal_status<'e, E>(exec: E, proposal_id: i64, status: ProposalStatus) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE proposals SET status = ? WHERE proposal_id = ?")
        .bind(status.as_str())
        .bind(proposal_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn mark_proposal_executed<'e, E>(exec: E, proposal_id: i64) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE proposals SET executed = 1 WHERE proposal_id = ?")
        .bind(proposal_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn count_proposals(pool: &Pool<Sqlite>, status: ProposalStatus) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM proposals WHERE status = ?")
        .bind(status.as_str())
        .fetch_one(pool)
        .await
}

// Fails with a unique violation when the member already voted
pub async fn insert_vote<'e, E>(
    exec: E,
    proposal_id: i64,
    member_id: i64,
    support: bool,
    cast_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO votes (proposal_id, member_id, support, cast_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(proposal_id)
    .bind(member_id)
    .bind(support)
    .bind(cast_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn increment_tally<'e, E>(exec: E, proposal_id: i64, support: bool) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let sql = if support {
        "UPDATE proposals SET yes_votes = yes_votes + 1 WHERE proposal_id = ?"
    } else {
        "UPDATE proposals SET no_votes = no_votes + 1 WHERE proposal_id = ?"
    };
    sqlx::query(sql).bind(proposal_id).execute(exec).await?;
    Ok(())
}

pub async fn get_vote(pool: &Pool<Sqlite>, proposal_id: i64, member_id: i64) -> Result<Option<Vote>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT proposal_id, member_id, support, cast_at
        FROM votes
        WHERE proposal_id = ? AND member_id = ?
        "#,
    )
    .bind(proposal_id)
    .bind(member_id)
    .fetch_optional(pool)
    .await?
    .map(|row| {
        Ok(Vote {
            proposal_id: row.try_get("proposal_id")?,
            member_id: row.try_get("member_id")?,
            support: row.try_get("support")?,
            cast_at: row.try_get("cast_at")?,
        })
    })
    .transpose()
}

pub async fn count_votes(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM votes").fetch_one(pool).await
}

/*==========Contract Transaction Queries=========== */

pub async fn insert_contract_transaction<'e, E>(
    exec: E,
    call_name: &str,
    sender: &WalletAddress,
    member_id: Option<i64>,
    amount: Option<Decimal>,
    receipt: &TxReceipt,
    created_at: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let block_number = i64::try_from(receipt.block_number)
        .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;

    let row = sqlx::query(
        r#"
        INSERT INTO contract_transactions
            (call_name, sender, member_id, amount, transaction_hash, block_number, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING tx_id
        "#,
    )
    .bind(call_name)
    .bind(sender.as_str())
    .bind(member_id)
    .bind(amount.map(|a| a.to_string()))
    .bind(&receipt.transaction_hash)
    .bind(block_number)
    .bind(created_at)
    .fetch_one(exec)
    .await?;

    row.try_get("tx_id")
}

pub async fn list_contract_transactions(
    pool: &Pool<Sqlite>,
    limit: i64,
) -> Result<Vec<ContractTransaction>, sqlx::Error> {
    sqlx::query(
        r#"
        SELECT tx_id, call_name, sender, member_id, amount, transaction_hash, block_number, created_at
        FROM contract_transactions
        ORDER BY tx_id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?
    .iter()
    .map(|row| {
        let amount: Option<String> = row.try_get("amount")?;
        let amount = amount
            .map(|text| Decimal::from_str(&text))
            .transpose()
            .map_err(|e| sqlx::Error::Decode(format!("Invalid Decimal format for amount: {}", e).into()))?;
        Ok(ContractTransaction {
            id: row.try_get("tx_id")?,
            call_name: row.try_get("call_name")?,
            sender: row.try_get("sender")?,
            member_id: row.try_get("member_id")?,
            amount,
            transaction_hash: row.try_get("transaction_hash")?,
            block_number: row.try_get("block_number")?,
            created_at: row.try_get("created_at")?,
        })
    })
    .collect()
}

pub async fn count_contract_transactions(pool: &Pool<Sqlite>) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM contract_transactions")
        .fetch_one(pool)
        .await
}

/*==========Admin Log Queries=========== */

pub async fn insert_admin_log<'e, E>(
    exec: E,
    action: &str,
    details: &str,
    admin_id: i64,
    ip_address: Option<&str>,
    created_at: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO admin_logs (action, details, admin_id, ip_address, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(action)
    .bind(details)
    .bind(admin_id)
    .bind(ip_address)
    .bind(created_at)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn list_admin_logs(pool: &Pool<Sqlite>, limit: i64) -> Result<Vec<AdminLog>, sqlx::Error> {
    sqlx::query_as::<_, AdminLog>(
        r#"
        SELECT log_id, action, details, admin_id, ip_address, created_at
        FROM admin_logs
        ORDER BY log_id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await
}

/*==========Deployment Queries=========== */

// Replaces any previous deployment
pub async fn replace_deployment(pool: &Pool<Sqlite>, deployment: &Deployment) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM deployments").execute(&mut *tx).await?;
    sqlx::query(
        r#"
        INSERT INTO deployments (contract_address, admin_address, deployed_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(&deployment.address)
    .bind(&deployment.admin)
    .bind(deployment.deployed_at)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

pub async fn get_current_deployment(pool: &Pool<Sqlite>) -> Result<Option<Deployment>, sqlx::Error> {
    sqlx::query_as::<_, Deployment>(
        r#"
        SELECT contract_address, admin_address, deployed_at
        FROM deployments
        ORDER BY deployment_id DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await
}

pub async fn clear_deployments(pool: &Pool<Sqlite>) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM deployments").execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
