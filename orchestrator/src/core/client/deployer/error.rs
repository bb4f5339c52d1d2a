use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeployerError {
    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("Deployment transaction failed: {0}")]
    Transaction(String),

    #[error("Receipt of transaction {tx_hash} has no contract address")]
    MissingContractAddress { tx_hash: String },
}
