use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use chrono::{SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use rstest::*;

use crate::core::client::database::MockDatabaseClient;
use crate::core::client::queue::MockQueueClient;
use crate::core::client::storage::MockStorageClient;
use crate::core::client::toolchain::ToolchainError;
use crate::types::circuit::{
    Circuit, CircuitArtifacts, CircuitParams, CircuitStatus, CircuitUpdates, DeploymentRecord, ParamValue,
};
use crate::types::jobs::JobMessage;
use crate::types::proof_request::{ProofRequest, ProofRequestUpdates};
use crate::types::queue::QueueType;

#[fixture]
pub fn range_params() -> CircuitParams {
    CircuitParams::from([("max".to_string(), ParamValue::Integer(20)), ("min".to_string(), ParamValue::Integer(10))])
}

#[fixture]
pub fn pending_circuit(range_params: CircuitParams) -> Circuit {
    Circuit::new_pending("f".repeat(64), "rangeCheck".to_string(), range_params)
}

#[fixture]
pub fn ready_circuit(pending_circuit: Circuit) -> Circuit {
    let mut circuit = pending_circuit;
    circuit.status = CircuitStatus::ReadyForDeployment;
    circuit.artifacts = Some(CircuitArtifacts::for_circuit(&circuit.id));
    circuit
}

/// Applies a partial update the way the `$set` document built by the database client does
pub fn apply_circuit_updates(circuit: &mut Circuit, update: &CircuitUpdates) {
    if let Some(status) = update.status {
        circuit.status = status;
    }
    if let Some(artifacts) = &update.artifacts {
        circuit.artifacts = Some(artifacts.clone());
    }
    if let Some(legacy) = &update.legacy_deployment {
        if let Some(artifacts) = circuit.artifacts.as_mut() {
            artifacts.deployment = Some(legacy.clone());
        }
    }
    let touches_deployment = update.deployment_job_id.is_some()
        || update.contract_address.is_some()
        || update.tx_hash.is_some()
        || update.deployed_at.is_some()
        || update.deployment_error.is_some();
    if touches_deployment {
        let record = circuit.deployment.get_or_insert_with(DeploymentRecord::default);
        if let Some(job_id) = &update.deployment_job_id {
            record.job_id = Some(job_id.clone());
        }
        if let Some(address) = &update.contract_address {
            record.contract_address = Some(address.clone());
        }
        if let Some(tx_hash) = &update.tx_hash {
            record.tx_hash = Some(tx_hash.clone());
        }
        if let Some(deployed_at) = update.deployed_at {
            record.deployed_at = Some(deployed_at);
        }
        if let Some(error) = &update.deployment_error {
            record.error = Some(error.clone());
        }
    }
    if let Some(error) = &update.error {
        circuit.error = Some(error.clone());
    }
    circuit.updated_at = Utc::now().round_subsecs(0);
}

fn apply_proof_updates(request: &mut ProofRequest, update: &ProofRequestUpdates) {
    if let Some(status) = update.status {
        request.status = status;
    }
    if let Some(artifacts) = &update.artifacts {
        request.artifacts = Some(artifacts.clone());
    }
    if let Some(error) = &update.error {
        request.error = Some(error.clone());
    }
    request.updated_at = Utc::now().round_subsecs(0);
}

/// Rows shared between a test and the [`MockDatabaseClient`] it hands to the config.
///
/// Conditional updates honour the allowed statuses, so the status machine behaves as it does against MongoDB.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    circuits: Arc<Mutex<HashMap<ObjectId, Circuit>>>,
    proof_requests: Arc<Mutex<HashMap<ObjectId, ProofRequest>>>,
}

impl InMemoryDatabase {
    pub fn with_circuit(circuit: Circuit) -> Self {
        let database = Self::default();
        database.circuits.lock().unwrap().insert(circuit.id, circuit);
        database
    }

    pub fn insert_proof_request(&self, proof_request: ProofRequest) {
        self.proof_requests.lock().unwrap().insert(proof_request.id, proof_request);
    }

    pub fn circuit(&self, id: ObjectId) -> Circuit {
        self.circuits.lock().unwrap().get(&id).cloned().expect("circuit not stored")
    }

    /// Overwrite the stored status, bypassing the allowed-status check
    pub fn set_status(&self, id: ObjectId, status: CircuitStatus) {
        if let Some(circuit) = self.circuits.lock().unwrap().get_mut(&id) {
            circuit.status = status;
        }
    }

    pub fn circuits(&self) -> Vec<Circuit> {
        self.circuits.lock().unwrap().values().cloned().collect()
    }

    pub fn circuit_count(&self) -> usize {
        self.circuits.lock().unwrap().len()
    }

    pub fn proof_request(&self, id: ObjectId) -> ProofRequest {
        self.proof_requests.lock().unwrap().get(&id).cloned().expect("proof request not stored")
    }

    pub fn proof_requests(&self) -> Vec<ProofRequest> {
        self.proof_requests.lock().unwrap().values().cloned().collect()
    }

    pub fn mock(&self) -> MockDatabaseClient {
        let mut db = MockDatabaseClient::new();

        let circuits = self.circuits.clone();
        db.expect_insert_circuit().returning(move |circuit| {
            circuits.lock().unwrap().insert(circuit.id, circuit.clone());
            Ok(circuit)
        });
        let circuits = self.circuits.clone();
        db.expect_get_circuit_by_id().returning(move |id| Ok(circuits.lock().unwrap().get(&id).cloned()));
        let circuits = self.circuits.clone();
        db.expect_get_circuit_by_hash().returning(move |hash| {
            Ok(circuits.lock().unwrap().values().find(|circuit| circuit.circuit_hash == hash).cloned())
        });
        let circuits = self.circuits.clone();
        db.expect_update_circuit().returning(move |id, allowed, update| {
            let mut circuits = circuits.lock().unwrap();
            match circuits.get_mut(&id) {
                Some(circuit) if allowed.contains(&circuit.status) => {
                    apply_circuit_updates(circuit, &update);
                    Ok(Some(circuit.clone()))
                }
                _ => Ok(None),
            }
        });

        let proofs = self.proof_requests.clone();
        db.expect_insert_proof_request().returning(move |request| {
            proofs.lock().unwrap().insert(request.id, request.clone());
            Ok(request)
        });
        let proofs = self.proof_requests.clone();
        db.expect_get_proof_request_by_id().returning(move |id| Ok(proofs.lock().unwrap().get(&id).cloned()));
        let proofs = self.proof_requests.clone();
        db.expect_update_proof_request().returning(move |id, allowed, update| {
            let mut proofs = proofs.lock().unwrap();
            match proofs.get_mut(&id) {
                Some(request) if allowed.contains(&request.status) => {
                    apply_proof_updates(request, &update);
                    Ok(Some(request.clone()))
                }
                _ => Ok(None),
            }
        });

        db.expect_health_check().returning(|| Ok(()));
        db
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub queue: QueueType,
    pub message: JobMessage,
    pub delay: Option<Duration>,
}

/// Captures everything sent through a [`MockQueueClient`]
#[derive(Clone, Default)]
pub struct RecordingQueue {
    sent: Arc<Mutex<Vec<SentMessage>>>,
}

impl RecordingQueue {
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, queue: QueueType) -> Vec<SentMessage> {
        self.sent().into_iter().filter(|sent| sent.queue == queue).collect()
    }

    pub fn mock(&self) -> MockQueueClient {
        let mut queue = MockQueueClient::new();
        let sent = self.sent.clone();
        queue.expect_send_message().returning(move |queue, payload, delay| {
            let message: JobMessage = serde_json::from_str(&payload).expect("queue payload is a job message");
            sent.lock().unwrap().push(SentMessage { queue, message, delay });
            Ok(())
        });
        queue.expect_health_check().returning(|| Ok(()));
        queue
    }
}

/// Blob store kept in memory
#[derive(Clone, Default)]
pub struct InMemoryStorage {
    objects: Arc<Mutex<HashMap<String, Bytes>>>,
}

impl InMemoryStorage {
    pub fn put(&self, key: &str, data: &[u8]) {
        self.objects.lock().unwrap().insert(key.to_string(), Bytes::copy_from_slice(data));
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn mock(&self) -> MockStorageClient {
        let mut storage = MockStorageClient::new();
        let objects = self.objects.clone();
        storage.expect_put_data().returning(move |data, key| {
            objects.lock().unwrap().insert(key.to_string(), data);
            Ok(())
        });
        let objects = self.objects.clone();
        storage.expect_get_data().returning(move |key| {
            let data = objects.lock().unwrap().get(key).cloned();
            Ok(data.unwrap_or_else(|| panic!("no object stored under {key}")))
        });
        storage.expect_health_check().returning(|| Ok(()));
        storage
    }
}

/// Stand-in for a toolchain command producing `path`
pub fn write_output(path: &Path, contents: &[u8]) -> Result<(), ToolchainError> {
    std::fs::write(path, contents)?;
    Ok(())
}

/// Upload the four key-generation artifacts of `circuit` with recognisable contents
pub fn store_circuit_artifacts(storage: &InMemoryStorage, circuit: &Circuit) {
    let artifacts = circuit.artifacts.as_ref().expect("circuit has artifacts");
    storage.put(&artifacts.wasm, b"wasm");
    storage.put(&artifacts.zkey, b"zkey");
    storage.put(&artifacts.vkey, b"{}");
    storage.put(&artifacts.verifier, b"contract Groth16Verifier {}");
}
