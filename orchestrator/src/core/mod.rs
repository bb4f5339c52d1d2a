// Core module - contains all the core abstractions

pub mod client;
pub mod cloud;
pub mod config;

// Re-export commonly used types from client
pub use client::database::DatabaseClient;
pub use client::deployer::ContractDeployer;
pub use client::queue::QueueClient;
pub use client::storage::StorageClient;
pub use client::toolchain::CircuitToolchain;
