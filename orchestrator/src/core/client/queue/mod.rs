pub mod error;
pub mod sqs;

use crate::types::queue::QueueType;
use async_trait::async_trait;
pub use error::QueueError;
use omniqueue::Delivery;
use std::time::Duration;

/// Trait defining queue operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QueueClient: Send + Sync {
    /// Send `payload` to `queue`, optionally hidden from consumers for `delay`
    async fn send_message(&self, queue: QueueType, payload: String, delay: Option<Duration>) -> Result<(), QueueError>;

    /// Receive one message, failing with `omniqueue::QueueError::NoData` when the queue is empty
    async fn consume_message_from_queue(&self, queue: QueueType) -> Result<Delivery, QueueError>;

    /// Perform a health check on the queue service
    ///
    /// This method verifies that every queue the orchestrator uses exists and is reachable.
    async fn health_check(&self) -> Result<(), QueueError>;
}
