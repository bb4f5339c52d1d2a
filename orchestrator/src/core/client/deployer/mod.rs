pub mod alloy;
pub mod error;

use async_trait::async_trait;
pub use error::DeployerError;
use url::Url;

/// Result of a locally signed contract creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployedContract {
    pub address: String,
    pub tx_hash: String,
    pub block_number: u64,
    pub chain_id: u64,
}

/// Signs and submits contract-creation transactions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ContractDeployer: Send + Sync {
    /// Deploy `bytecode` through `rpc_url`, signing with `private_key`, and wait for the receipt
    async fn deploy_contract(
        &self,
        rpc_url: &Url,
        private_key: &str,
        bytecode: Vec<u8>,
    ) -> Result<DeployedContract, DeployerError>;
}

/// Human readable name of well known chains, "unknown" otherwise.
pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        1 => "mainnet",
        10 => "optimism",
        137 => "matic",
        8453 => "base",
        17000 => "holesky",
        42161 => "arbitrum",
        80002 => "matic-amoy",
        11155111 => "sepolia",
        _ => "unknown",
    }
}
