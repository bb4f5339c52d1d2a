use alloy::network::{EthereumWallet, TransactionBuilder};
use alloy::primitives::Bytes;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::signers::local::PrivateKeySigner;
use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use crate::core::client::deployer::{ContractDeployer, DeployedContract, DeployerError};

/// Deploys contracts over JSON-RPC with a local signer.
#[derive(Debug, Clone, Default)]
pub struct AlloyDeployer;

impl AlloyDeployer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ContractDeployer for AlloyDeployer {
    async fn deploy_contract(
        &self,
        rpc_url: &Url,
        private_key: &str,
        bytecode: Vec<u8>,
    ) -> Result<DeployedContract, DeployerError> {
        let signer: PrivateKeySigner =
            private_key.parse().map_err(|e| DeployerError::InvalidPrivateKey(format!("{}", e)))?;
        let deployer_address = signer.address();
        let wallet = EthereumWallet::from(signer);
        let provider = ProviderBuilder::new().with_recommended_fillers().wallet(wallet).on_http(rpc_url.clone());

        let chain_id = provider.get_chain_id().await.map_err(|e| DeployerError::Rpc(e.to_string()))?;
        debug!(chain_id, deployer = %deployer_address, "Connected to deployment network");

        let tx = TransactionRequest::default().with_deploy_code(Bytes::from(bytecode));
        let receipt = provider
            .send_transaction(tx)
            .await
            .map_err(|e| DeployerError::Transaction(e.to_string()))?
            .get_receipt()
            .await
            .map_err(|e| DeployerError::Transaction(e.to_string()))?;

        let tx_hash = receipt.transaction_hash.to_string();
        let address = receipt.contract_address.ok_or(DeployerError::MissingContractAddress { tx_hash: tx_hash.clone() })?;
        let block_number = receipt.block_number.unwrap_or_default();

        info!(address = %address, tx_hash = %tx_hash, block_number, chain_id, "Contract deployed");
        Ok(DeployedContract { address: address.to_string(), tx_hash, block_number, chain_id })
    }
}
