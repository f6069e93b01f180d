//! Runtime configuration read from the environment (and `.env` via dotenvy).

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::database::models::WalletAddress;

const DEV_AUTH_SECRET: &str = "village-sacco-development-secret";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub auth_secret: String,
    pub token_ttl: Duration,
    pub minimum_savings: Decimal,
    pub default_interest_bps: i64,
    pub voting_period: chrono::Duration,
    pub quorum_percent: u32,
    pub contract_latency: Duration,
    pub explorer_url: String,
    pub demo_fallback: bool,
    pub bootstrap_admin: Option<WalletAddress>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite://./village_sacco.db?mode=rwc".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            auth_secret: DEV_AUTH_SECRET.to_string(),
            token_ttl: Duration::from_secs(86_400),
            minimum_savings: Decimal::from(10),
            default_interest_bps: 500,
            voting_period: chrono::Duration::days(7),
            quorum_percent: 10,
            contract_latency: Duration::from_millis(2000),
            explorer_url: "https://sepolia.basescan.org".to_string(),
            demo_fallback: false,
            bootstrap_admin: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let auth_secret = match env::var("SACCO_AUTH_SECRET") {
            Ok(secret) if !secret.is_empty() => secret,
            _ => {
                tracing::warn!("SACCO_AUTH_SECRET not set, using the development secret");
                defaults.auth_secret.clone()
            }
        };

        let bootstrap_admin = match env::var("SACCO_BOOTSTRAP_ADMIN") {
            Ok(raw) if !raw.is_empty() => Some(WalletAddress::parse(&raw).map_err(|_| {
                ConfigError::InvalidEnvVar("SACCO_BOOTSTRAP_ADMIN".to_string(), raw.clone())
            })?),
            _ => None,
        };

        let voting_days: i64 = parse_var("SACCO_VOTING_PERIOD_DAYS", 7)?;
        let quorum_percent: u32 = parse_var("SACCO_QUORUM_PERCENT", defaults.quorum_percent)?;
        if quorum_percent > 100 {
            return Err(ConfigError::InvalidEnvVar(
                "SACCO_QUORUM_PERCENT".to_string(),
                quorum_percent.to_string(),
            ));
        }

        Ok(Self {
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: parse_var("SACCO_BIND_ADDR", defaults.bind_addr)?,
            auth_secret,
            token_ttl: Duration::from_secs(parse_var("SACCO_TOKEN_TTL_SECS", 86_400)?),
            minimum_savings: parse_var("SACCO_MINIMUM_SAVINGS", defaults.minimum_savings)?,
            default_interest_bps: parse_var("SACCO_DEFAULT_INTEREST_BPS", defaults.default_interest_bps)?,
            voting_period: chrono::Duration::days(voting_days),
            quorum_percent,
            contract_latency: Duration::from_millis(parse_var("SACCO_CONTRACT_LATENCY_MS", 2000)?),
            explorer_url: env::var("SACCO_EXPLORER_URL").unwrap_or(defaults.explorer_url),
            demo_fallback: parse_var("SACCO_DEMO_FALLBACK", defaults.demo_fallback)?,
            bootstrap_admin,
        })
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidEnvVar(name.to_string(), raw)),
        _ => Ok(default),
    }
}
