use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::types::circuit::{CircuitArtifacts, CircuitParams};
use crate::types::queue::QueueType;

/// Envelope of every message exchanged on the job queues.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    pub job_key: String,
    /// 1-based attempt counter, bumped each time the job is re-enqueued after a failure
    pub attempt: u32,
    pub payload: JobPayload,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    KeyGeneration(KeyGenerationPayload),
    ProofGeneration(ProofGenerationPayload),
    Cleanup(CleanupPayload),
    LegacyDeploy(LegacyDeployPayload),
    Deployment(DeploymentPayload),
}

impl JobPayload {
    pub fn queue_type(&self) -> QueueType {
        match self {
            JobPayload::KeyGeneration(_) => QueueType::KeyGeneration,
            JobPayload::ProofGeneration(_) => QueueType::ProofGeneration,
            JobPayload::Cleanup(_) => QueueType::Cleanup,
            JobPayload::LegacyDeploy(_) => QueueType::LegacyDeploy,
            JobPayload::Deployment(_) => QueueType::Deployment,
        }
    }

    fn subject(&self) -> String {
        match self {
            JobPayload::KeyGeneration(payload) => payload.circuit_id.clone(),
            JobPayload::ProofGeneration(payload) => payload.proof_request_id.clone(),
            JobPayload::Cleanup(payload) => payload.path.display().to_string(),
            JobPayload::LegacyDeploy(payload) => payload.circuit_id.clone(),
            JobPayload::Deployment(payload) => payload.circuit_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyGenerationPayload {
    pub circuit_id: String,
    pub template_name: String,
    pub params: CircuitParams,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofGenerationPayload {
    pub proof_request_id: String,
    pub circuit_id: String,
    pub private_inputs: Map<String, Value>,
    #[serde(default)]
    pub public_inputs: Map<String, Value>,
}

impl ProofGenerationPayload {
    /// Single input document for the prover. Private inputs are applied last and win on collision.
    pub fn merged_inputs(&self) -> Map<String, Value> {
        let mut inputs = self.public_inputs.clone();
        for (key, value) in &self.private_inputs {
            inputs.insert(key.clone(), value.clone());
        }
        inputs
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupPayload {
    pub path: PathBuf,
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDeployPayload {
    pub circuit_id: String,
    pub artifacts: CircuitArtifacts,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    pub rpc_url: Url,
    pub private_key: String,
}

impl fmt::Debug for LegacyDeployPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LegacyDeployPayload")
            .field("circuit_id", &self.circuit_id)
            .field("artifacts", &self.artifacts)
            .field("chain_id", &self.chain_id)
            .field("rpc_url", &self.rpc_url.as_str())
            .field("private_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentPayload {
    pub circuit_id: String,
}

impl JobMessage {
    /// First attempt of a job, keyed `<queue prefix>:<subject>`
    pub fn new(payload: JobPayload) -> Self {
        let job_key = payload.queue_type().job_key(payload.subject());
        Self { job_key, attempt: 1, payload }
    }

    pub fn queue_type(&self) -> QueueType {
        self.payload.queue_type()
    }

    /// The same job for its next attempt
    pub fn next_attempt(&self) -> Self {
        Self { job_key: self.job_key.clone(), attempt: self.attempt + 1, payload: self.payload.clone() }
    }
}
