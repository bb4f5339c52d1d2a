use crate::core::client::queue::QueueError;
use crate::{
    core::client::queue::QueueClient,
    types::{params::QueueArgs, queue::QueueType},
    OrchestratorError,
};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sqs::types::QueueAttributeName;
use aws_sdk_sqs::Client;
use omniqueue::backends::{SqsBackend, SqsConfig, SqsConsumer};
use omniqueue::Delivery;
use std::collections::HashMap;
use std::time::Duration;
use strum::IntoEnumIterator;

/// SQS refuses delays above 15 minutes
const MAX_DELAY_SECONDS: u64 = 900;

#[derive(Clone, Debug)]
pub struct InnerSQS(Client);

impl InnerSQS {
    /// Creates a new instance of InnerSQS with the provided AWS configuration.
    pub fn new(aws_config: &SdkConfig) -> Self {
        let sqs_config_builder = aws_sdk_sqs::config::Builder::from(aws_config);
        let client = Client::from_conf(sqs_config_builder.build());
        Self(client)
    }

    pub fn client(&self) -> &Client {
        &self.0
    }

    /// get_queue_url_from_client - Get the queue URL from the client
    /// This function returns the queue URL based on the queue name.
    pub async fn get_queue_url_from_client(&self, queue_name: &str) -> Result<String, QueueError> {
        Ok(self
            .client()
            .get_queue_url()
            .queue_name(queue_name)
            .send()
            .await?
            .queue_url()
            .ok_or_else(|| QueueError::FailedToGetQueueUrl(queue_name.to_string()))?
            .to_string())
    }

    /// get_queue_name_from_type - Get the queue specific name from its type
    /// This function returns the queue name based on the queue type provided
    pub fn get_queue_name_from_type(name: &str, queue_type: &QueueType) -> String {
        name.replace("{}", &queue_type.to_string())
    }

    /// Create a new queue with the given name
    pub async fn create_queue(&self, queue_name: String, visibility_timeout: u32) -> Result<String, OrchestratorError> {
        let mut attributes = HashMap::new();
        attributes.insert(QueueAttributeName::VisibilityTimeout, visibility_timeout.to_string());
        let res = self
            .client()
            .create_queue()
            .queue_name(&queue_name)
            .set_attributes(Some(attributes))
            .send()
            .await
            .map_err(|e| {
                OrchestratorError::ResourceSetupError(format!("Failed to create SQS queue '{}': {}", queue_name, e))
            })?;

        Ok(res
            .queue_url()
            .ok_or_else(|| OrchestratorError::ResourceSetupError("Failed to get SQS URL".to_string()))?
            .to_string())
    }
}

#[derive(Clone, Debug)]
pub struct SQS {
    pub inner: InnerSQS,
    queue_template: String,
}

impl SQS {
    pub fn new(aws_config: &SdkConfig, args: &QueueArgs) -> Self {
        Self { inner: InnerSQS::new(aws_config), queue_template: args.queue_template.clone() }
    }

    pub fn client(&self) -> &Client {
        self.inner.client()
    }

    /// get_queue_name - The template with `{}` replaced by the queue type
    pub fn get_queue_name(&self, queue_type: &QueueType) -> String {
        InnerSQS::get_queue_name_from_type(&self.queue_template, queue_type)
    }

    /// get_consumer - Get the consumer for the given queue
    async fn get_consumer(&self, queue: QueueType) -> Result<SqsConsumer, QueueError> {
        let queue_name = self.get_queue_name(&queue);
        tracing::debug!("Getting queue url for queue name {}", queue_name);
        let queue_url = self.inner.get_queue_url_from_client(queue_name.as_str()).await?;
        tracing::debug!("Found queue url {}", queue_url);

        let consumer =
            SqsBackend::builder(SqsConfig { queue_dsn: queue_url, override_endpoint: false }).build_consumer().await?;
        Ok(consumer)
    }
}

fn delay_seconds(delay: Duration) -> i32 {
    // bounded by MAX_DELAY_SECONDS, the cast cannot truncate
    delay.as_secs().min(MAX_DELAY_SECONDS) as i32
}

#[async_trait]
impl QueueClient for SQS {
    async fn send_message(&self, queue: QueueType, payload: String, delay: Option<Duration>) -> Result<(), QueueError> {
        let queue_name = self.get_queue_name(&queue);
        let queue_url = self.inner.get_queue_url_from_client(queue_name.as_str()).await?;

        let mut send_message_request =
            self.inner.client().send_message().queue_url(&queue_url).message_body(&payload);

        if let Some(delay_duration) = delay {
            send_message_request = send_message_request.delay_seconds(delay_seconds(delay_duration));
        }

        send_message_request.send().await?;

        tracing::debug!(queue = %queue_name, "Sent message to queue");

        Ok(())
    }

    async fn consume_message_from_queue(&self, queue: QueueType) -> Result<Delivery, QueueError> {
        let mut consumer = self.get_consumer(queue).await?;
        Ok(consumer.receive().await?)
    }

    async fn health_check(&self) -> Result<(), QueueError> {
        for queue_type in QueueType::iter() {
            self.inner.get_queue_url_from_client(&self.get_queue_name(&queue_type)).await?;
        }
        Ok(())
    }
}
