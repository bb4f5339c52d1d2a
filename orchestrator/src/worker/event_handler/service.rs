use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use opentelemetry::KeyValue;
use tracing::{error, info, warn};

use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::types::jobs::JobMessage;
use crate::types::queue_control::{JobPolicy, QUEUES};
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::worker::event_handler::factory;
use crate::worker::event_handler::jobs::JobHandlerTrait;
use crate::worker::service::JobService;

/// What happens to a job after one attempt
#[derive(Debug, Clone, PartialEq)]
pub enum JobDisposition {
    Completed,
    /// Send `next` back to the queue after `delay`
    Retry { next: JobMessage, delay: Duration },
    /// No attempt left or the error cannot be fixed by retrying
    Exhausted,
}

/// Decide the fate of a job from the queue policy and the outcome of the attempt
pub fn disposition(policy: &JobPolicy, message: &JobMessage, result: &JobResult<()>) -> JobDisposition {
    match result {
        Ok(()) => JobDisposition::Completed,
        Err(e) if e.is_retryable() && message.attempt < policy.attempts => JobDisposition::Retry {
            next: message.next_attempt(),
            delay: policy.backoff.delay_after(message.attempt),
        },
        Err(_) => JobDisposition::Exhausted,
    }
}

pub struct JobHandlerService;

impl JobHandlerService {
    /// Run one delivery of a job through the handler of its queue.
    ///
    /// `Ok` means the delivery can be acknowledged: the job succeeded, was re-enqueued for a later
    /// attempt, or its terminal failure was recorded. `Err` means that bookkeeping itself failed.
    pub async fn handle_job(config: Arc<Config>, message: &JobMessage) -> JobResult<()> {
        let handler = factory::get_job_handler(message.queue_type());
        Self::handle_job_with(handler.as_ref(), config, message).await
    }

    pub async fn handle_job_with(
        handler: &dyn JobHandlerTrait,
        config: Arc<Config>,
        message: &JobMessage,
    ) -> JobResult<()> {
        let start = Instant::now();
        let queue = message.queue_type();
        let policy = QUEUES
            .get(&queue)
            .map(|queue_config| queue_config.policy)
            .ok_or_else(|| JobError::Other(format!("No policy configured for queue {}", queue)))?;

        info!(job_key = %message.job_key, attempt = message.attempt, max_attempts = policy.attempts, "Processing job");

        let result = match AssertUnwindSafe(handler.process_job(config.clone(), message)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => {
                let msg = Self::extract_panic_message(&panic);
                error!(job_key = %message.job_key, panic = %msg, "Job panicked");
                Err(JobError::Other(format!("Panic: {}", msg)))
            }
        };

        let attributes = [KeyValue::new("operation_job_type", queue.to_string())];
        ORCHESTRATOR_METRICS.jobs_response_time.record(start.elapsed().as_secs_f64(), &attributes);

        match disposition(&policy, message, &result) {
            JobDisposition::Completed => {
                info!(job_key = %message.job_key, duration_ms = start.elapsed().as_millis() as u64, "Job completed");
                ORCHESTRATOR_METRICS.successful_job_operations.add(1, &attributes);
                Ok(())
            }
            JobDisposition::Retry { next, delay } => {
                let error = result.err().ok_or_else(|| JobError::Other("Retry without an error".to_string()))?;
                warn!(
                    job_key = %message.job_key,
                    attempt = message.attempt,
                    delay_secs = delay.as_secs(),
                    error = %error,
                    "Job attempt failed, retrying"
                );
                ORCHESTRATOR_METRICS.failed_job_operations.add(1, &attributes);
                handler.on_failure(config.clone(), message, &error, false).await?;
                JobService::add_job_to_queue(&config, &next, Some(delay)).await
            }
            JobDisposition::Exhausted => {
                let error = result.err().ok_or_else(|| JobError::Other("Exhausted without an error".to_string()))?;
                error!(
                    job_key = %message.job_key,
                    attempt = message.attempt,
                    retryable = error.is_retryable(),
                    error = %error,
                    "Job failed permanently"
                );
                ORCHESTRATOR_METRICS.failed_job_operations.add(1, &attributes);
                handler.on_failure(config, message, &error, true).await
            }
        }
    }

    fn extract_panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
        if let Some(s) = panic.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        }
    }
}
