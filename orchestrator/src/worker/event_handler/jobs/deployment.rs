use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use opentelemetry::KeyValue;
use tracing::{debug, error, info, instrument, warn, Span};
use zkflow_deployment_service::{DeploymentJobStatus, DeploymentState};

use super::{parse_entity_id, JobHandlerTrait};
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::registry::CircuitRegistry;
use crate::types::circuit::{CircuitStatus, CircuitUpdates};
use crate::types::constant::DEFAULT_DEPLOYMENT_FAILURE_MESSAGE;
use crate::types::jobs::{DeploymentPayload, JobMessage, JobPayload};
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::utils::timer::PollDeadline;

pub struct DeploymentJobHandler;

/// What the contract registry reported once the deployment went through
#[derive(Debug, Clone, PartialEq)]
struct DeployedContractInfo {
    address: String,
    tx_hash: Option<String>,
    deployed_at: DateTime<Utc>,
}

fn payload(message: &JobMessage) -> JobResult<&DeploymentPayload> {
    match &message.payload {
        JobPayload::Deployment(payload) => Ok(payload),
        other => Err(JobError::Validation(format!("Expected a deployment payload, got {:?}", other.queue_type()))),
    }
}

pub(crate) fn parse_deployed_at(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|value| DateTime::parse_from_rfc3339(value).ok())
        .map(|value| value.with_timezone(&Utc))
        .unwrap_or_else(Utc::now)
}

pub(crate) fn record_deployment_outcome(path: &'static str, outcome: &'static str) {
    ORCHESTRATOR_METRICS
        .deployment_outcomes
        .add(1, &[KeyValue::new("deployment_path", path), KeyValue::new("outcome", outcome)]);
}

impl DeploymentJobHandler {
    /// Everything that happens while this job holds the `deploying` claim
    async fn deploy_claimed(config: &Config, circuit_id: ObjectId, circuit_hex: &str) -> JobResult<()> {
        let job_id = config
            .deployment_service()
            .start_deployment(circuit_hex)
            .await
            .map_err(|e| JobError::ExternalServiceFailure(e.to_string()))?;
        Span::current().record("deployment_job_id", job_id.as_str());
        info!("Deployment started");

        let started = CircuitUpdates { deployment_job_id: Some(job_id.clone()), ..Default::default() };
        if CircuitRegistry::transition_circuit(config.database(), circuit_id, &[CircuitStatus::Deploying], started)
            .await?
            .is_none()
        {
            return Err(JobError::StateConflict(format!(
                "Circuit {} left deploying before job {} was recorded",
                circuit_id, job_id
            )));
        }

        let deployed = Self::poll_until_deployed(config, &circuit_id, &job_id).await?;

        let update = CircuitUpdates::deployed(deployed.address.clone(), deployed.tx_hash, deployed.deployed_at);
        match CircuitRegistry::transition_circuit(config.database(), circuit_id, &[CircuitStatus::Deploying], update)
            .await?
        {
            Some(_) => {
                info!(contract_address = %deployed.address, "Circuit deployed");
                record_deployment_outcome("orchestrated", "deployed");
                Ok(())
            }
            None => {
                error!(
                    contract_address = %deployed.address,
                    "Circuit left deploying before the deployment finished, contract address not recorded"
                );
                record_deployment_outcome("orchestrated", "unrecorded");
                Err(JobError::StateConflict(format!(
                    "Circuit {} left deploying before contract {} was recorded",
                    circuit_id, deployed.address
                )))
            }
        }
    }

    /// Hand a claimed circuit back to `ready_for_deployment` so a later attempt can pick it up
    async fn release_claim(config: &Config, circuit_id: ObjectId, error: &JobError) -> JobResult<()> {
        let release = CircuitUpdates {
            status: Some(CircuitStatus::ReadyForDeployment),
            deployment_error: Some(error.to_string()),
            ..Default::default()
        };
        CircuitRegistry::transition_circuit(config.database(), circuit_id, &[CircuitStatus::Deploying], release).await?;
        Ok(())
    }

    /// Poll the deployment job until the contract registry knows the contract, the provider reports
    /// a failure, or the attempt budget runs out.
    async fn poll_until_deployed(
        config: &Config,
        circuit_id: &ObjectId,
        job_id: &str,
    ) -> JobResult<DeployedContractInfo> {
        let service = config.deployment_service();
        let poll = *config.deployment_poll();
        let circuit_hex = circuit_id.to_hex();

        let mut deadline = PollDeadline::new(poll.interval, poll.max_attempts);
        let mut job_completed = false;
        let mut contract_info_tries = 0;

        while let Some(attempt) = deadline.next_attempt() {
            let fatal = deadline.in_final_window(poll.fatal_window);

            if !job_completed {
                match service.get_deployment_status(job_id).await {
                    Ok(DeploymentJobStatus { state, error }) => {
                        debug!(attempt, max_attempts = poll.max_attempts, state = ?state, "Deployment status");
                        if state.is_success() {
                            job_completed = true;
                        } else if state.is_failure() {
                            let message = error.unwrap_or_else(|| DEFAULT_DEPLOYMENT_FAILURE_MESSAGE.to_string());
                            return Err(JobError::ExternalServiceFailure(format!("Deployment failed: {}", message)));
                        } else if let DeploymentState::Unknown(status) = state {
                            warn!(attempt, status = %status, "Unknown deployment status, ignoring");
                        }
                    }
                    Err(e) if fatal => {
                        return Err(JobError::ExternalServiceFailure(format!(
                            "Deployment status check failed: {}",
                            e
                        )));
                    }
                    Err(e) => warn!(attempt, error = %e, "Deployment status check failed, will retry"),
                }
            }

            if job_completed {
                contract_info_tries += 1;
                match service.get_contract_info(&circuit_hex).await {
                    Ok(info) => {
                        if let Some(address) = info.deployed_address() {
                            return Ok(DeployedContractInfo {
                                address: address.to_string(),
                                tx_hash: info.tx_hash.clone(),
                                deployed_at: parse_deployed_at(info.deployed_at.as_deref()),
                            });
                        }
                        debug!(
                            try_no = contract_info_tries,
                            state = ?info.state,
                            "Contract info not ready yet"
                        );
                    }
                    Err(e) if fatal => {
                        return Err(JobError::ExternalServiceFailure(format!("Contract info check failed: {}", e)));
                    }
                    Err(e) => warn!(try_no = contract_info_tries, error = %e, "Failed to get contract info"),
                }
                if contract_info_tries >= poll.contract_info_attempts {
                    return Err(JobError::ExternalServiceFailure(format!(
                        "Contract info not available after {} attempts. Job status was completed but contract not deployed.",
                        poll.contract_info_attempts
                    )));
                }
            }

            if attempt < poll.max_attempts {
                deadline.wait().await;
            }
        }

        // the deadline may have cut the loop short of max_attempts
        Err(JobError::ExternalServiceFailure(format!("Deployment timed out after {} attempts", deadline.attempt())))
    }
}

#[async_trait]
impl JobHandlerTrait for DeploymentJobHandler {
    #[instrument(skip_all, fields(circuit_id = tracing::field::Empty, deployment_job_id = tracing::field::Empty))]
    async fn process_job(&self, config: Arc<Config>, message: &JobMessage) -> JobResult<()> {
        let payload = payload(message)?;
        Span::current().record("circuit_id", payload.circuit_id.as_str());
        let circuit_id = parse_entity_id("Circuit", &payload.circuit_id)?;

        let circuit = CircuitRegistry::get_circuit_by_object_id(config.database(), circuit_id).await?;
        if circuit.status != CircuitStatus::ReadyForDeployment {
            return Err(JobError::StateConflict(format!(
                "Circuit not ready for deployment. Current status: {}",
                circuit.status
            )));
        }
        if circuit.verifier_key().is_none() {
            return Err(JobError::StateConflict("Verifier contract not available".to_string()));
        }

        // only one job may drive the circuit from here on
        let claim = CircuitUpdates::status(CircuitStatus::Deploying);
        if CircuitRegistry::transition_circuit(config.database(), circuit_id, &[CircuitStatus::ReadyForDeployment], claim)
            .await?
            .is_none()
        {
            return Err(JobError::StateConflict(format!(
                "Circuit {} was claimed by another deployment",
                circuit_id
            )));
        }

        match Self::deploy_claimed(&config, circuit_id, &payload.circuit_id).await {
            Ok(()) => Ok(()),
            Err(e @ JobError::StateConflict(_)) => Err(e),
            Err(e) => {
                Self::release_claim(&config, circuit_id, &e).await?;
                Err(e)
            }
        }
    }

    async fn on_failure(
        &self,
        config: Arc<Config>,
        message: &JobMessage,
        error: &JobError,
        final_attempt: bool,
    ) -> JobResult<()> {
        // precondition failures leave the circuit as it is
        if matches!(error, JobError::NotFound { .. } | JobError::StateConflict(_)) {
            return Ok(());
        }
        // a failed attempt has already released its claim, other jobs' claims are never touched
        if !final_attempt {
            return Ok(());
        }
        let Ok(payload) = payload(message) else { return Ok(()) };
        let Ok(circuit_id) = parse_entity_id("Circuit", &payload.circuit_id) else { return Ok(()) };
        let updated = CircuitRegistry::transition_circuit(
            config.database(),
            circuit_id,
            &[CircuitStatus::ReadyForDeployment],
            CircuitUpdates::deployment_failed(error.to_string()),
        )
        .await?;
        if updated.is_some() {
            warn!(circuit_id = %circuit_id, error = %error, "Circuit deployment failed");
            record_deployment_outcome("orchestrated", "failed");
        }
        Ok(())
    }
}
