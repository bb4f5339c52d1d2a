use thiserror::Error;

use crate::error::ConsumptionError;
use crate::types::queue::QueueType;

/// Result type for the event system
pub type EventSystemResult<T> = Result<T, EventSystemError>;

/// EventSystemError - Error type for the queue workers and their controller
#[derive(Error, Debug)]
pub enum EventSystemError {
    #[error("Event Handler Already existing for Queue Type : {0:?}")]
    EventHandlerAlreadyExisting(QueueType),

    #[error("Message Parsing Serde Error: {0}")]
    PayloadSerdeError(String),

    #[error("Message for queue {expected} arrived on queue {actual}")]
    WrongQueue { expected: QueueType, actual: QueueType },

    #[error("ConsumptionError: {0}")]
    FromConsumptionError(#[from] ConsumptionError),

    #[error("Mutex poisoned: {0}")]
    MutexPoisonError(String),
}
