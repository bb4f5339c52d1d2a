use std::path::PathBuf;
use std::time::Duration;

use mongodb::bson::oid::ObjectId;

use crate::core::config::Config;
use crate::error::job::JobResult;
use crate::types::circuit::Circuit;
use crate::types::jobs::{
    CleanupPayload, DeploymentPayload, JobMessage, JobPayload, KeyGenerationPayload, LegacyDeployPayload,
    ProofGenerationPayload,
};

/// Producer side of the job queues.
pub struct JobService;

impl JobService {
    /// Add a job message into its queue with the given delay
    ///
    /// # Arguments
    /// * `config` - Shared configuration
    /// * `message` - The job to send, the queue is derived from its payload
    /// * `delay` - Optional delay before the message becomes visible
    pub async fn add_job_to_queue(config: &Config, message: &JobMessage, delay: Option<Duration>) -> JobResult<()> {
        let queue = message.queue_type();
        let payload = serde_json::to_string(message)?;

        tracing::info!(
            queue = %queue,
            job_key = %message.job_key,
            attempt = message.attempt,
            delay_secs = ?delay.map(|d| d.as_secs()),
            "Sending message to queue"
        );

        config.queue().send_message(queue, payload, delay).await.inspect_err(|e| {
            tracing::error!(queue = %queue, job_key = %message.job_key, error = %e, "Failed to send message to queue");
        })?;
        Ok(())
    }

    async fn enqueue(config: &Config, payload: JobPayload) -> JobResult<()> {
        Self::add_job_to_queue(config, &JobMessage::new(payload), None).await
    }

    pub async fn enqueue_key_generation(config: &Config, circuit: &Circuit) -> JobResult<()> {
        Self::enqueue(
            config,
            JobPayload::KeyGeneration(KeyGenerationPayload {
                circuit_id: circuit.id.to_hex(),
                template_name: circuit.template.clone(),
                params: circuit.params.clone(),
            }),
        )
        .await
    }

    pub async fn enqueue_deployment(config: &Config, circuit_id: &ObjectId) -> JobResult<()> {
        Self::enqueue(config, JobPayload::Deployment(DeploymentPayload { circuit_id: circuit_id.to_hex() })).await
    }

    pub async fn enqueue_proof_generation(config: &Config, payload: ProofGenerationPayload) -> JobResult<()> {
        Self::enqueue(config, JobPayload::ProofGeneration(payload)).await
    }

    pub async fn enqueue_legacy_deploy(config: &Config, payload: LegacyDeployPayload) -> JobResult<()> {
        Self::enqueue(config, JobPayload::LegacyDeploy(payload)).await
    }

    pub async fn enqueue_cleanup(config: &Config, path: PathBuf) -> JobResult<()> {
        Self::enqueue(config, JobPayload::Cleanup(CleanupPayload { path })).await
    }
}
