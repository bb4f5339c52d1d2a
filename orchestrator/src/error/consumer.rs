use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsumptionError {
    #[error("Queue {0} has no configuration")]
    QueueNotFound(String),

    #[error("Failed to consume message from queue, error {error_msg:?}")]
    FailedToConsumeFromQueue { error_msg: String },

    #[error("Failed to handle job {job_key:?}. Error: {error_msg:?}")]
    FailedToHandleJob { job_key: String, error_msg: String },

    #[error("Failed to acknowledge message: {0}")]
    FailedToAcknowledgeMessage(String),

    #[error("Other error: {0}")]
    Other(String),
}
