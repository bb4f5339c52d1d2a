//! Client for the external contract deployment service.
//!
//! The service exposes three endpoints: one to start a deployment for a circuit,
//! one to poll a deployment job and one to read the contract registry entry of a circuit.

pub mod client;
pub mod error;
pub mod types;

use async_trait::async_trait;
use mockall::automock;

pub use client::{DeploymentServiceClient, DeploymentServiceTimeouts};
pub use error::DeploymentServiceError;
pub use types::{ContractInfo, DeploymentJobStatus, DeploymentState};

#[automock]
#[async_trait]
pub trait DeploymentService: Send + Sync {
    /// Starts a deployment and returns the provider job id
    async fn start_deployment(&self, circuit_id: &str) -> Result<String, DeploymentServiceError>;
    async fn get_deployment_status(&self, job_id: &str) -> Result<DeploymentJobStatus, DeploymentServiceError>;
    async fn get_contract_info(&self, circuit_id: &str) -> Result<ContractInfo, DeploymentServiceError>;
    async fn health_check(&self) -> Result<(), DeploymentServiceError>;
}

#[async_trait]
impl DeploymentService for DeploymentServiceClient {
    async fn start_deployment(&self, circuit_id: &str) -> Result<String, DeploymentServiceError> {
        self.start(circuit_id).await
    }

    async fn get_deployment_status(&self, job_id: &str) -> Result<DeploymentJobStatus, DeploymentServiceError> {
        self.status(job_id).await
    }

    async fn get_contract_info(&self, circuit_id: &str) -> Result<ContractInfo, DeploymentServiceError> {
        self.contract(circuit_id).await
    }

    async fn health_check(&self) -> Result<(), DeploymentServiceError> {
        self.ping().await
    }
}
