pub mod consumer;
pub mod event;
pub mod job;

use thiserror::Error;

use crate::core::client::database::DatabaseError;
use crate::core::client::queue::QueueError;
use crate::core::client::storage::StorageError;
use crate::error::event::EventSystemError;
pub use consumer::ConsumptionError;

/// Result type for orchestrator operations
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Error types for the orchestrator
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Storage error: {0}")]
    StorageError(#[from] StorageError),

    #[error("Queue error: {0}")]
    QueueCoreError(#[from] QueueError),

    #[error("Database error: {0}")]
    DatabaseCoreError(#[from] DatabaseError),

    /// Setup Command error
    #[error("Setup Command Error: {0}")]
    SetupCommandError(String),

    /// Run Command error
    #[error("Run Command Error: {0}")]
    RunCommandError(String),

    #[error("Orchestrator Error: {0}")]
    OrchestratorAnyHowError(#[from] anyhow::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Resource Setup error
    #[error("Resource setup error: {0}")]
    ResourceSetupError(String),

    /// Setup error
    #[error("Setup error: {0}")]
    SetupError(String),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Event System Error: {0}")]
    EventSystemError(#[from] EventSystemError),

    #[error("Instrumentation error: {0}")]
    InstrumentationError(#[from] opentelemetry::metrics::MetricsError),
}
