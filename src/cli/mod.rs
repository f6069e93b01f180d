//! Command-line entry
//! - `serve` runs the REST backend (default)
//! - the rest are operator chores against the same database

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::backend::{self, auth::TokenSigner};
use crate::config::AppConfig;
use crate::contract::MockSaccoContract;
use crate::database::db::{connection, migrate};
use crate::database::models::WalletAddress;
use crate::sacco::Sacco;

#[derive(Parser, Debug)]
#[command(author, version, about = "Village SACCO backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply database migrations and exit
    Migrate,
    /// Create or promote a wallet to super admin
    GrantAdmin {
        #[arg(long)]
        wallet: String,
    },
    /// Print a session token for a wallet
    IssueToken {
        #[arg(long)]
        wallet: String,
    },
    /// Deploy the mock contract on behalf of an admin wallet
    Deploy {
        #[arg(long)]
        admin: String,
    },
    /// Print the SACCO dashboard figures as JSON
    Stats,
}

pub async fn run(cli: Cli, config: AppConfig) -> Result<()> {
    let command = cli.command.unwrap_or(Command::Serve);

    // no database needed to sign a token
    if let Command::IssueToken { wallet } = &command {
        let wallet = WalletAddress::parse(wallet)?;
        let issued = TokenSigner::new(&config.auth_secret, config.token_ttl).issue(&wallet, Utc::now())?;
        println!("{}", issued.token);
        tracing::info!(%wallet, expires_at = %issued.expires_at, "token issued");
        return Ok(());
    }

    let pool = connection::get_db_pool(&config.database_url)
        .await
        .with_context(|| format!("failed to open database {}", config.database_url))?;
    migrate::run_migrations(&pool).await?;

    let contract = Arc::new(MockSaccoContract::new(config.contract_latency));
    let sacco = Sacco::new(pool, contract, config);

    match command {
        Command::Serve => {
            if let Some(id) = sacco.ensure_bootstrap_admin().await? {
                tracing::info!(member_id = id, "bootstrap admin ready");
            }
            backend::run_server(sacco).await?;
        }
        Command::Migrate => {
            tracing::info!("migrations applied");
        }
        Command::GrantAdmin { wallet } => {
            let wallet = WalletAddress::parse(&wallet)?;
            let id = sacco.grant_super_admin(&wallet).await?;
            println!("{wallet} is now SUPER_ADMIN (member {id})");
        }
        Command::Deploy { admin } => {
            let wallet = WalletAddress::parse(&admin)?;
            let admin = sacco
                .member_by_wallet(&wallet)
                .await?
                .filter(|m| m.role.is_admin())
                .with_context(|| format!("{wallet} is not an admin"))?;
            let deployment = sacco.deploy_contract(&admin, None).await?;
            println!("{}", serde_json::to_string_pretty(&deployment)?);
        }
        Command::Stats => {
            let stats = sacco.sacco_stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::IssueToken { .. } => {}
    }

    Ok(())
}
