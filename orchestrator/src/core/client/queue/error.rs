use aws_sdk_sqs::error::SdkError;
use aws_sdk_sqs::operation::get_queue_url::GetQueueUrlError;
use aws_sdk_sqs::operation::send_message::SendMessageError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Failed to get queue url for queue {0}")]
    FailedToGetQueueUrl(String),

    #[error("Queue error: {0}")]
    ErrorFromQueueError(#[from] omniqueue::QueueError),

    #[error("Failed to resolve queue url: {0}")]
    GetQueueUrlError(#[from] SdkError<GetQueueUrlError>),

    #[error("Failed to send message: {0}")]
    SendMessageError(#[from] SdkError<SendMessageError>),

    #[error("Failed to serialize message: {0}")]
    MessageSerializationError(#[from] serde_json::Error),
}
