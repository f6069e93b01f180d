use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;

use super::{ContractCall, ContractError, SaccoContract, TxReceipt};
use crate::database::models::{Deployment, WalletAddress};

/// Development stand-in for the on-chain contract: waits `latency`, then
/// answers with a random transaction hash and block number.
#[derive(Debug, Clone)]
pub struct MockSaccoContract {
    latency: Duration,
}

impl MockSaccoContract {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// No simulated latency.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    rand::thread_rng().fill(buf.as_mut_slice());
    format!("0x{}", hex::encode(buf))
}

#[async_trait]
impl SaccoContract for MockSaccoContract {
    async fn submit(&self, sender: &WalletAddress, call: ContractCall) -> Result<TxReceipt, ContractError> {
        let method = call.method();
        tracing::debug!(%sender, method, "submitting mock contract call");

        self.simulate_latency().await;

        let receipt = TxReceipt {
            transaction_hash: random_hex(32),
            block_number: rand::thread_rng().gen_range(0..1_000_000),
        };
        tracing::info!(
            %sender,
            method,
            tx = %receipt.transaction_hash,
            block = receipt.block_number,
            "mock contract call confirmed"
        );
        Ok(receipt)
    }

    async fn deploy(&self, admin: &WalletAddress) -> Result<Deployment, ContractError> {
        tracing::info!(%admin, "mock deploying SACCO contract");
        self.simulate_latency().await;

        let deployed = Deployment {
            address: random_hex(20),
            admin: admin.to_string(),
            deployed_at: Utc::now(),
        };
        tracing::info!(address = %deployed.address, "mock SACCO contract deployed");
        Ok(deployed)
    }
}
