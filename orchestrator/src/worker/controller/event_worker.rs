use crate::core::client::queue::QueueError;
use crate::core::config::Config;
use crate::error::event::{EventSystemError, EventSystemResult};
use crate::error::ConsumptionError;
use crate::types::jobs::JobMessage;
use crate::types::queue::QueueType;
use crate::types::queue_control::QUEUES;
use crate::worker::event_handler::service::JobHandlerService;
use crate::worker::traits::message::MessageParser;
use omniqueue::Delivery;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument, Span};
use uuid::Uuid;

#[derive(Clone)]
pub struct EventWorker {
    config: Arc<Config>,
    queue_type: QueueType,
    max_concurrent_tasks: usize,
    cancellation_token: CancellationToken,
}

const QUEUE_GET_MESSAGE_WAIT_TIMEOUT_SECS: Duration = Duration::from_secs(30);
const QUEUE_NO_MESSAGE_SLEEP_DURATION: Duration = Duration::from_millis(1000);

impl EventWorker {
    /// new - Create a worker bound to `queue_type`
    /// The number of jobs run at the same time comes from the service configuration,
    /// falling back to the queue's own default.
    pub fn new(
        queue_type: QueueType,
        config: Arc<Config>,
        cancellation_token: CancellationToken,
    ) -> EventSystemResult<Self> {
        if !QUEUES.contains_key(&queue_type) {
            return Err(ConsumptionError::QueueNotFound(queue_type.to_string()))?;
        }
        let max_concurrent_tasks = config.service_config().concurrency_for(queue_type).max(1);
        Ok(Self { queue_type, config, max_concurrent_tasks, cancellation_token })
    }

    pub fn queue_type(&self) -> QueueType {
        self.queue_type
    }

    pub fn max_concurrent_tasks(&self) -> usize {
        self.max_concurrent_tasks
    }

    /// Triggers a graceful shutdown
    pub async fn shutdown(&self) -> EventSystemResult<()> {
        info!("Triggering shutdown for {} worker", self.queue_type);
        self.cancellation_token.cancel();
        Ok(())
    }

    /// Check if shutdown has been requested (non-blocking)
    pub fn is_shutdown_requested(&self) -> bool {
        self.cancellation_token.is_cancelled()
    }

    /// One span per delivery, carrying the job identity for every log line of the handler
    fn create_job_span(&self, message: &JobMessage) -> Span {
        let correlation_id = Uuid::new_v4();
        tracing::info_span!(
            "job",
            job_key = %message.job_key,
            attempt = message.attempt,
            correlation_id = %correlation_id,
            span_type = "Job"
        )
    }

    /// get_message - Wait for the next message of this worker's queue
    /// Returns `Ok(None)` when nothing arrived within the wait timeout.
    pub async fn get_message(&self) -> EventSystemResult<Option<Delivery>> {
        let start = Instant::now();

        loop {
            match self.config.queue().consume_message_from_queue(self.queue_type).await {
                Ok(delivery) => return Ok(Some(delivery)),
                Err(QueueError::ErrorFromQueueError(omniqueue::QueueError::NoData)) => {
                    if start.elapsed() > QUEUE_GET_MESSAGE_WAIT_TIMEOUT_SECS {
                        return Ok(None);
                    }
                    sleep(QUEUE_NO_MESSAGE_SLEEP_DURATION).await;
                }
                Err(e) => {
                    error!(queue = %self.queue_type, error = %e, "Failed to consume message from queue");
                    return Err(ConsumptionError::FailedToConsumeFromQueue { error_msg: e.to_string() })?;
                }
            }
        }
    }

    /// Decode a delivery and make sure it belongs to this queue
    fn parse_message(&self, message: &Delivery) -> EventSystemResult<JobMessage> {
        let parsed = *JobMessage::parse_message(message)?;
        if parsed.queue_type() != self.queue_type {
            return Err(EventSystemError::WrongQueue { expected: self.queue_type, actual: parsed.queue_type() });
        }
        Ok(parsed)
    }

    /// process_message - Parse, handle and settle one delivery
    ///
    /// A message that cannot be parsed will never succeed, so it is acknowledged and dropped.
    /// A handled job is acknowledged once its outcome (success, retry or terminal failure) is
    /// recorded. When that bookkeeping fails the delivery is negatively acknowledged so the
    /// broker hands it out again.
    async fn process_message(&self, message: Delivery) -> EventSystemResult<()> {
        let job = match self.parse_message(&message) {
            Ok(job) => job,
            Err(e) => {
                error!(queue = %self.queue_type, error = %e, "Dropping malformed message");
                message.ack().await.map_err(|e| ConsumptionError::FailedToAcknowledgeMessage(e.0.to_string()))?;
                return Err(e);
            }
        };
        debug!(queue = %self.queue_type, job_key = %job.job_key, "Received message from queue");

        let span = self.create_job_span(&job);
        let outcome = JobHandlerService::handle_job(self.config.clone(), &job).instrument(span.clone()).await;
        match outcome {
            Ok(()) => {
                message.ack().await.map_err(|e| ConsumptionError::FailedToAcknowledgeMessage(e.0.to_string()))?;
                Ok(())
            }
            Err(error) => {
                span.in_scope(|| error!(error = %error, "Failed to record job outcome, releasing message"));
                message.nack().await.map_err(|e| ConsumptionError::FailedToAcknowledgeMessage(e.0.to_string()))?;
                Err(ConsumptionError::FailedToHandleJob { job_key: job.job_key, error_msg: error.to_string() })?
            }
        }
    }

    /// run - Consume the queue until shutdown, keeping at most `max_concurrent_tasks` jobs in flight
    pub async fn run(&self) -> EventSystemResult<()> {
        let mut tasks = JoinSet::new();
        let max_concurrent_tasks = self.max_concurrent_tasks;
        info!("Starting {} worker (pool_size={})", self.queue_type, max_concurrent_tasks);

        loop {
            if self.is_shutdown_requested() {
                info!("Shutdown requested, stopping message processing");
                break;
            }

            tokio::select! {
                biased;

                Some(result) = tasks.join_next(), if !tasks.is_empty() => {
                    Self::handle_task_result(result);
                }

                _ = self.cancellation_token.cancelled() => {
                    info!("Shutdown signal received, breaking from main loop");
                    break;
                }

                message_result = self.get_message(), if tasks.len() < max_concurrent_tasks => {
                    match message_result {
                        Ok(Some(message)) => {
                            let worker = self.clone();
                            tasks.spawn(async move { worker.process_message(message).await });
                            if tasks.len() >= max_concurrent_tasks {
                                warn!("Backpressure activated - waiting for tasks to complete. Active: {}", tasks.len());
                            }
                        }
                        Ok(None) => sleep(QUEUE_NO_MESSAGE_SLEEP_DURATION).await,
                        Err(e) => {
                            error!("Error receiving message: {:?}", e);
                            sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        }

        info!("Waiting for {} remaining tasks to complete", tasks.len());
        while let Some(result) = tasks.join_next().await {
            Self::handle_task_result(result);
        }
        info!("All tasks completed, worker shutdown complete");

        Ok(())
    }

    fn handle_task_result(result: Result<EventSystemResult<()>, tokio::task::JoinError>) {
        match result {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                error!("Task failed with application error: {:?}", e);
            }
            Err(e) => {
                error!("Task panicked or was cancelled: {:?}", e);
            }
        }
    }
}
