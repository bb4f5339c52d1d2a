use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, instrument, warn, Span};

use super::{parse_entity_id, release_scratch, JobHandlerTrait};
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::registry::{CircuitRegistry, ProofRequestRegistry};
use crate::types::circuit::CircuitArtifacts;
use crate::types::constant::{PROOF_FILE, PROOF_INPUT_FILE, PUBLIC_SIGNALS_FILE, WITNESS_FILE};
use crate::types::jobs::{JobMessage, JobPayload, ProofGenerationPayload};
use crate::types::proof_request::ProofArtifacts;
use crate::utils::scratch::ScratchDir;

pub struct ProofGenerationJobHandler;

fn payload(message: &JobMessage) -> JobResult<&ProofGenerationPayload> {
    match &message.payload {
        JobPayload::ProofGeneration(payload) => Ok(payload),
        other => Err(JobError::Validation(format!("Expected a proof generation payload, got {:?}", other.queue_type()))),
    }
}

impl ProofGenerationJobHandler {
    async fn download(config: &Config, key: &str, destination: &Path) -> JobResult<()> {
        let data = config.storage().get_data(key).await?;
        tokio::fs::write(destination, &data).await?;
        debug!(key = %key, bytes = data.len(), "Downloaded artifact");
        Ok(())
    }

    async fn read_json(path: &Path) -> JobResult<Value> {
        let raw = tokio::fs::read(path).await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn prove(config: &Config, payload: &ProofGenerationPayload, workdir: &ScratchDir) -> JobResult<ProofArtifacts> {
        let circuit = CircuitRegistry::get_circuit(config.database(), &payload.circuit_id).await?;
        let artifacts = circuit
            .artifacts
            .ok_or_else(|| JobError::Validation("Circuit artifacts not available".to_string()))?;

        let wasm = workdir.join(CircuitArtifacts::WASM_FILE);
        let zkey = workdir.join(CircuitArtifacts::ZKEY_FILE);
        Self::download(config, &artifacts.wasm, &wasm).await?;
        Self::download(config, &artifacts.zkey, &zkey).await?;

        let input = workdir.join(PROOF_INPUT_FILE);
        tokio::fs::write(&input, serde_json::to_vec(&Value::Object(payload.merged_inputs()))?).await?;

        let witness = workdir.join(WITNESS_FILE);
        let proof = workdir.join(PROOF_FILE);
        let public = workdir.join(PUBLIC_SIGNALS_FILE);
        let toolchain = config.toolchain();
        toolchain.calculate_witness(&wasm, &input, &witness).await?;
        toolchain.generate_proof(&zkey, &witness, &proof, &public).await?;

        Ok(ProofArtifacts { proof: Self::read_json(&proof).await?, public: Self::read_json(&public).await? })
    }
}

#[async_trait]
impl JobHandlerTrait for ProofGenerationJobHandler {
    #[instrument(skip_all, fields(proof_request_id = tracing::field::Empty, circuit_id = tracing::field::Empty))]
    async fn process_job(&self, config: Arc<Config>, message: &JobMessage) -> JobResult<()> {
        let payload = payload(message)?;
        Span::current().record("proof_request_id", payload.proof_request_id.as_str());
        Span::current().record("circuit_id", payload.circuit_id.as_str());

        let proof_request = ProofRequestRegistry::get_proof_request(config.database(), &payload.proof_request_id).await?;
        if proof_request.status.is_terminal() {
            info!(status = %proof_request.status, "Proof request already finished, nothing to do");
            return Ok(());
        }

        let workdir = ScratchDir::create(&config.pipeline_config().processing_dir).await?;
        let result = Self::prove(&config, payload, &workdir).await;
        release_scratch(&config, workdir).await;
        let artifacts = result?;

        if ProofRequestRegistry::mark_proof_completed(config.database(), proof_request.id, artifacts).await?.is_some() {
            info!("Proof generated");
        }
        Ok(())
    }

    async fn on_failure(
        &self,
        config: Arc<Config>,
        message: &JobMessage,
        error: &JobError,
        final_attempt: bool,
    ) -> JobResult<()> {
        if !final_attempt {
            return Ok(());
        }
        let Ok(payload) = payload(message) else { return Ok(()) };
        let Ok(id) = parse_entity_id("ProofRequest", &payload.proof_request_id) else { return Ok(()) };
        if let JobError::NotFound { entity: "ProofRequest", .. } = error {
            return Ok(());
        }

        if ProofRequestRegistry::mark_proof_failed(config.database(), id, error.to_string()).await?.is_some() {
            warn!(proof_request_id = %id, error = %error, "Proof generation failed");
        }
        Ok(())
    }
}
