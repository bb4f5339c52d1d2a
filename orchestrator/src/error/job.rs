use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::deployer::DeployerError;
use crate::core::client::queue::QueueError;
use crate::core::client::storage::StorageError;
use crate::core::client::toolchain::ToolchainError;
use crate::registry::RegistryError;

pub type JobResult<T> = Result<T, JobError>;

/// Error types for job-related operations in the orchestrator
#[derive(Error, Debug)]
pub enum JobError {
    /// Malformed payload or parameters, retrying cannot help
    #[error("{0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The entity is not in the status the step requires
    #[error("{0}")]
    StateConflict(String),

    /// Compiler, key ceremony or prover failure
    #[error("{0}")]
    ExternalToolFailure(#[from] ToolchainError),

    /// Deployment Service failure. Carries the exact message written on the circuit.
    #[error("{0}")]
    ExternalServiceFailure(String),

    #[error("{0}")]
    Deployer(#[from] DeployerError),

    #[error("Database error: {0}")]
    StoreUnavailable(#[from] DatabaseError),

    /// Unexpected value from an external provider
    #[error("Unknown status '{status}' from {source_name}")]
    UnknownStatus { source_name: &'static str, status: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize data: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl JobError {
    /// Whether another attempt of the same job may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            JobError::Validation(_)
            | JobError::NotFound { .. }
            | JobError::StateConflict(_)
            | JobError::UnknownStatus { .. } => false,
            JobError::ExternalToolFailure(_)
            | JobError::ExternalServiceFailure(_)
            | JobError::Deployer(_)
            | JobError::StoreUnavailable(_)
            | JobError::Storage(_)
            | JobError::Queue(_)
            | JobError::Io(_)
            | JobError::Json(_)
            | JobError::Other(_) => true,
        }
    }
}

impl From<RegistryError> for JobError {
    fn from(value: RegistryError) -> Self {
        match value {
            RegistryError::NotFound { entity, id } => JobError::NotFound { entity, id },
            RegistryError::StoreUnavailable(e) => JobError::StoreUnavailable(e),
        }
    }
}
