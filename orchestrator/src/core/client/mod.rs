// Client abstractions module - contains all client interface traits

pub mod database;
pub mod deployer;
pub mod queue;
pub mod storage;
pub mod toolchain;

// Re-export commonly used types
pub use database::{mongodb::MongoDbClient, DatabaseClient};
pub use deployer::{alloy::AlloyDeployer, ContractDeployer};
pub use queue::{sqs::SQS, QueueClient};
pub use storage::{s3::AWSS3, StorageClient};
pub use toolchain::{snarkjs::SnarkjsToolchain, CircuitToolchain};
