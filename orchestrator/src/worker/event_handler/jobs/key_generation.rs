use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use mongodb::bson::oid::ObjectId;
use tracing::{debug, info, instrument, warn, Span};

use super::{parse_entity_id, release_scratch, JobHandlerTrait};
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::registry::CircuitRegistry;
use crate::types::circuit::{CircuitArtifacts, CircuitParams, CircuitStatus, CircuitUpdates};
use crate::types::constant::INITIAL_ZKEY_FILE;
use crate::types::jobs::{JobMessage, JobPayload, KeyGenerationPayload};
use crate::utils::scratch::ScratchDir;
use crate::utils::template::{is_valid_template_name, render_template, template_path};
use crate::worker::service::JobService;

pub struct KeyGenerationJobHandler;

fn payload(message: &JobMessage) -> JobResult<&KeyGenerationPayload> {
    match &message.payload {
        JobPayload::KeyGeneration(payload) => Ok(payload),
        other => Err(JobError::Validation(format!("Expected a key generation payload, got {:?}", other.queue_type()))),
    }
}

impl KeyGenerationJobHandler {
    /// Render, compile, run the key ceremony and upload the four artifacts.
    async fn generate_keys(
        config: &Config,
        circuit_id: &ObjectId,
        template: &str,
        params: &CircuitParams,
        scratch: &ScratchDir,
    ) -> JobResult<CircuitArtifacts> {
        let pipeline = config.pipeline_config();
        let toolchain = config.toolchain();

        if !is_valid_template_name(template) {
            return Err(JobError::Validation(format!("Invalid template name '{}'", template)));
        }
        let template_file = template_path(&pipeline.templates_dir, template);
        let source = match tokio::fs::read_to_string(&template_file).await {
            Ok(source) => source,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(JobError::Validation(format!("Template '{}' not found", template)));
            }
            Err(e) => return Err(e.into()),
        };
        let rendered =
            render_template(&source, params).map_err(|e| JobError::Other(format!("Failed to render template: {}", e)))?;

        let circuit_file = scratch.join(format!("{}_{}.circom", template, scratch.id()));
        tokio::fs::write(&circuit_file, rendered).await?;
        debug!(path = %circuit_file.display(), "Rendered circuit source");

        let compiled = toolchain.compile_circuit(&circuit_file, scratch.path()).await?;
        info!("Circuit compiled");

        let initial_zkey = scratch.join(INITIAL_ZKEY_FILE);
        let final_zkey = scratch.join(CircuitArtifacts::ZKEY_FILE);
        let vkey = scratch.join(CircuitArtifacts::VKEY_FILE);
        let verifier = scratch.join(CircuitArtifacts::VERIFIER_FILE);

        toolchain.groth16_setup(&compiled.r1cs, &initial_zkey).await?;
        toolchain.apply_beacon(&initial_zkey, &final_zkey).await?;
        toolchain.export_verification_key(&final_zkey, &vkey).await?;
        toolchain.export_verifier(&final_zkey, &verifier).await?;
        info!("Keys generated");

        let artifacts = CircuitArtifacts::for_circuit(circuit_id);
        for (file, key) in [
            (compiled.wasm.as_path(), &artifacts.wasm),
            (final_zkey.as_path(), &artifacts.zkey),
            (vkey.as_path(), &artifacts.vkey),
            (verifier.as_path(), &artifacts.verifier),
        ] {
            Self::upload(config, file, key).await?;
        }
        Ok(artifacts)
    }

    async fn upload(config: &Config, file: &Path, key: &str) -> JobResult<()> {
        let data = tokio::fs::read(file).await?;
        config.storage().put_data(Bytes::from(data), key).await?;
        debug!(key = %key, "Uploaded artifact");
        Ok(())
    }
}

#[async_trait]
impl JobHandlerTrait for KeyGenerationJobHandler {
    #[instrument(skip_all, fields(circuit_id = tracing::field::Empty))]
    async fn process_job(&self, config: Arc<Config>, message: &JobMessage) -> JobResult<()> {
        let payload = payload(message)?;
        Span::current().record("circuit_id", payload.circuit_id.as_str());
        let circuit_id = parse_entity_id("Circuit", &payload.circuit_id)?;

        let circuit = CircuitRegistry::get_circuit_by_object_id(config.database(), circuit_id).await?;
        match circuit.status {
            CircuitStatus::Pending => {}
            CircuitStatus::ReadyForDeployment => {
                // an earlier attempt got this far but could not enqueue the deployment
                info!("Keys already generated, enqueueing deployment");
                return JobService::enqueue_deployment(&config, &circuit_id).await;
            }
            CircuitStatus::Deploying | CircuitStatus::Deployed => {
                info!(status = %circuit.status, "Circuit is past key generation, nothing to do");
                return Ok(());
            }
            CircuitStatus::Failed => {
                return Err(JobError::StateConflict(format!("Circuit {} has already failed", circuit_id)));
            }
        }

        let scratch = ScratchDir::create(&config.pipeline_config().processing_dir).await?;
        let result =
            Self::generate_keys(&config, &circuit_id, &payload.template_name, &payload.params, &scratch).await;
        release_scratch(&config, scratch).await;
        let artifacts = result?;

        let updated = CircuitRegistry::transition_circuit(
            config.database(),
            circuit_id,
            &[CircuitStatus::Pending],
            CircuitUpdates::ready(artifacts),
        )
        .await?;
        if updated.is_none() {
            warn!("Circuit left pending while its keys were generated, deployment not enqueued");
            return Ok(());
        }
        info!("Circuit ready for deployment");

        JobService::enqueue_deployment(&config, &circuit_id).await
    }

    async fn on_failure(
        &self,
        config: Arc<Config>,
        message: &JobMessage,
        error: &JobError,
        final_attempt: bool,
    ) -> JobResult<()> {
        if !final_attempt || matches!(error, JobError::NotFound { .. } | JobError::StateConflict(_)) {
            return Ok(());
        }
        let Ok(payload) = payload(message) else { return Ok(()) };
        let Ok(circuit_id) = parse_entity_id("Circuit", &payload.circuit_id) else { return Ok(()) };

        let updated = CircuitRegistry::transition_circuit(
            config.database(),
            circuit_id,
            &[CircuitStatus::Pending],
            CircuitUpdates::failed(error.to_string()),
        )
        .await?;
        if updated.is_some() {
            warn!(circuit_id = %circuit_id, error = %error, "Circuit key generation failed");
        }
        Ok(())
    }
}
