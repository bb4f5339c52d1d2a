use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn, Span};

use super::deployment::record_deployment_outcome;
use super::{parse_entity_id, release_scratch, JobHandlerTrait};
use crate::core::client::deployer::{network_name, DeployedContract};
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::registry::CircuitRegistry;
use crate::types::circuit::{CircuitUpdates, LegacyDeployment};
use crate::types::constant::LEGACY_VERIFIER_FILE;
use crate::types::jobs::{JobMessage, JobPayload, LegacyDeployPayload};
use crate::utils::scratch::ScratchDir;

/// Direct deployment: compile the verifier locally and sign the creation transaction with the
/// caller's key. The outcome lands on `artifacts.deployment`, the circuit status is not touched.
pub struct LegacyDeployJobHandler;

fn payload(message: &JobMessage) -> JobResult<&LegacyDeployPayload> {
    match &message.payload {
        JobPayload::LegacyDeploy(payload) => Ok(payload),
        other => Err(JobError::Validation(format!("Expected a legacy deploy payload, got {:?}", other.queue_type()))),
    }
}

impl LegacyDeployJobHandler {
    async fn compile_and_deploy(
        config: &Config,
        payload: &LegacyDeployPayload,
        scratch: &ScratchDir,
    ) -> JobResult<DeployedContract> {
        let source = config.storage().get_data(&payload.artifacts.verifier).await?;
        let verifier = scratch.join(LEGACY_VERIFIER_FILE);
        tokio::fs::write(&verifier, &source).await?;

        let bytecode = config.toolchain().compile_contract(&verifier).await?;
        info!(bytecode_len = bytecode.len(), "Verifier compiled");

        Ok(config.deployer().deploy_contract(&payload.rpc_url, &payload.private_key, bytecode).await?)
    }
}

#[async_trait]
impl JobHandlerTrait for LegacyDeployJobHandler {
    #[instrument(skip_all, fields(circuit_id = tracing::field::Empty))]
    async fn process_job(&self, config: Arc<Config>, message: &JobMessage) -> JobResult<()> {
        let payload = payload(message)?;
        Span::current().record("circuit_id", payload.circuit_id.as_str());
        let circuit_id = parse_entity_id("Circuit", &payload.circuit_id)?;
        CircuitRegistry::get_circuit_by_object_id(config.database(), circuit_id).await?;

        let scratch = ScratchDir::create(&config.pipeline_config().processing_dir).await?;
        let result = Self::compile_and_deploy(&config, payload, &scratch).await;
        release_scratch(&config, scratch).await;
        let contract = result?;

        if let Some(expected) = payload.chain_id.filter(|expected| *expected != contract.chain_id) {
            warn!(expected, actual = contract.chain_id, "Endpoint reports a different chain id than requested");
        }

        let deployment = LegacyDeployment {
            network: network_name(contract.chain_id).to_string(),
            address: contract.address,
            chain_id: contract.chain_id,
            tx_hash: contract.tx_hash,
            block_number: contract.block_number,
        };
        info!(address = %deployment.address, tx_hash = %deployment.tx_hash, network = %deployment.network, "Verifier deployed");

        let update = CircuitUpdates { legacy_deployment: Some(deployment), ..Default::default() };
        if CircuitRegistry::update_circuit_fields(config.database(), circuit_id, update).await?.is_none() {
            warn!("Circuit reached a terminal status, deployment record not stored");
        }
        record_deployment_outcome("legacy", "deployed");
        Ok(())
    }

    async fn on_failure(
        &self,
        _config: Arc<Config>,
        message: &JobMessage,
        error: &JobError,
        final_attempt: bool,
    ) -> JobResult<()> {
        if final_attempt {
            error!(job_key = %message.job_key, error = %error, "Legacy deployment failed");
            record_deployment_outcome("legacy", "failed");
        }
        Ok(())
    }
}
