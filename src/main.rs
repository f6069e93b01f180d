// src/main.rs
use clap::Parser;
use dotenvy::dotenv;
use village_sacco::{cli, config::AppConfig, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    telemetry::init();

    let args = cli::Cli::parse();
    let config = AppConfig::from_env()?;

    cli::run(args, config).await
}
