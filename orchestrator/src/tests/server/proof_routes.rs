use axum::http::{Method, StatusCode};
use mongodb::bson::oid::ObjectId;
use rstest::*;
use serde_json::json;

use super::{error_body, send};
use crate::core::client::queue::{MockQueueClient, QueueError};
use crate::tests::common::{pending_circuit, ready_circuit, InMemoryDatabase, RecordingQueue};
use crate::tests::config::TestConfigBuilder;
use crate::types::circuit::{Circuit, CircuitStatus};
use crate::types::jobs::JobPayload;
use crate::types::proof_request::{ProofArtifacts, ProofRequest, ProofRequestStatus};
use crate::types::queue::QueueType;

#[rstest]
#[tokio::test]
async fn proof_request_for_pending_circuit_is_rejected(pending_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(pending_circuit.clone());
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        "/v1/proofs",
        Some(json!({ "circuitId": pending_circuit.id.to_hex(), "privateInputs": { "value": 15 } })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_body("Circuit not ready for proof generation"));
    assert!(database.proof_requests().is_empty());
}

#[rstest]
#[tokio::test]
async fn proof_request_for_unknown_circuit_is_rejected() {
    let services = TestConfigBuilder::new().mock_db_client(InMemoryDatabase::default().mock()).build();

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        "/v1/proofs",
        Some(json!({ "circuitId": ObjectId::new().to_hex(), "privateInputs": {} })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_body("Circuit not ready for proof generation"));
}

#[rstest]
#[case(CircuitStatus::ReadyForDeployment)]
#[case(CircuitStatus::Deploying)]
#[case(CircuitStatus::Deployed)]
#[tokio::test]
async fn proof_request_is_enqueued(mut ready_circuit: Circuit, #[case] circuit_status: CircuitStatus) {
    ready_circuit.status = circuit_status;
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let queue = RecordingQueue::default();
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).mock_queue(queue.mock()).build();

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        "/v1/proofs",
        Some(json!({
            "circuitId": ready_circuit.id.to_hex(),
            "privateInputs": { "value": 15 },
            "publicInputs": { "threshold": 10 },
            "userId": "user-1",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    let id = ObjectId::parse_str(body["proofRequestId"].as_str().unwrap()).unwrap();
    let stored = database.proof_request(id);
    assert_eq!(stored.status, ProofRequestStatus::Pending);
    assert_eq!(stored.circuit_id, ready_circuit.id);
    assert_eq!(stored.user_id.as_deref(), Some("user-1"));

    let sent = queue.sent_to(QueueType::ProofGeneration);
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message.job_key, format!("proof:{}", id.to_hex()));
    match &sent[0].message.payload {
        JobPayload::ProofGeneration(payload) => {
            assert_eq!(payload.circuit_id, ready_circuit.id.to_hex());
            assert_eq!(payload.private_inputs["value"], 15);
            assert_eq!(payload.public_inputs["threshold"], 10);
        }
        other => panic!("unexpected payload {other:?}"),
    }
}

#[rstest]
#[tokio::test]
async fn proof_status_code_follows_the_request_status(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let pending = ProofRequest::new_pending(ready_circuit.id, None);
    let mut completed = ProofRequest::new_pending(ready_circuit.id, None);
    completed.status = ProofRequestStatus::Completed;
    completed.artifacts = Some(ProofArtifacts { proof: json!({ "pi_a": [] }), public: json!(["1"]) });
    let mut failed = ProofRequest::new_pending(ready_circuit.id, None);
    failed.status = ProofRequestStatus::Failed;
    failed.error = Some("Circuit artifacts not available".to_string());
    for request in [&pending, &completed, &failed] {
        database.insert_proof_request(request.clone());
    }
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, body) =
        send(services.config.clone(), Method::GET, &format!("/v1/proofs/{}", pending.id.to_hex()), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "pending");
    assert_eq!(body["message"], "Proof generation is still in progress");

    let (status, body) =
        send(services.config.clone(), Method::GET, &format!("/v1/proofs/{}", completed.id.to_hex()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["artifacts"]["public"], json!(["1"]));
    assert!(body.get("completedAt").is_some());

    let (status, body) =
        send(services.config.clone(), Method::GET, &format!("/v1/proofs/{}", failed.id.to_hex()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "failed");
    assert_eq!(body["error"], "Circuit artifacts not available");
    assert!(body.get("failedAt").is_some());
}

#[rstest]
#[tokio::test]
async fn proof_status_reports_bad_and_unknown_ids() {
    let services = TestConfigBuilder::new().mock_db_client(InMemoryDatabase::default().mock()).build();

    let (status, body) = send(services.config.clone(), Method::GET, "/v1/proofs/xyz", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_body("Invalid proofRequestId format"));

    let (status, body) =
        send(services.config.clone(), Method::GET, &format!("/v1/proofs/{}", ObjectId::new().to_hex()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_body("Proof request not found"));
}

#[rstest]
#[tokio::test]
async fn proof_request_is_failed_when_generation_cannot_be_enqueued(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let mut queue = MockQueueClient::new();
    queue
        .expect_send_message()
        .returning(|queue, _, _| Err(QueueError::FailedToGetQueueUrl(queue.to_string())));
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).mock_queue(queue).build();

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        "/v1/proofs",
        Some(json!({ "circuitId": ready_circuit.id.to_hex(), "privateInputs": { "value": 15 } })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, error_body("Internal server error"));
    let requests = database.proof_requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].status, ProofRequestStatus::Failed);
    assert!(requests[0].error.as_deref().unwrap().starts_with("Failed to enqueue proof generation: "));
}
