use axum::http::{Method, StatusCode};
use mongodb::bson::oid::ObjectId;
use rstest::*;
use serde_json::json;

use super::{error_body, send};
use crate::tests::common::{ready_circuit, InMemoryDatabase};
use crate::tests::config::TestConfigBuilder;
use crate::types::circuit::{Circuit, CircuitStatus};

const WEBHOOK: &str = "/v1/webhooks/deployment-status";

#[rstest]
#[tokio::test]
async fn failed_notification_fails_the_circuit(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        WEBHOOK,
        Some(json!({ "circuitId": ready_circuit.id.to_hex(), "status": "failed", "error": "out of gas" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "message": "Status update processed", "circuitId": ready_circuit.id.to_hex(), "status": "failed" })
    );
    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Failed);
    assert_eq!(circuit.error.as_deref(), Some("out of gas"));
    assert_eq!(circuit.deployment.unwrap().error.as_deref(), Some("out of gas"));
}

#[rstest]
#[tokio::test]
async fn error_notification_without_message_uses_default(mut ready_circuit: Circuit) {
    ready_circuit.status = CircuitStatus::Deploying;
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, _) = send(
        services.config.clone(),
        Method::POST,
        WEBHOOK,
        Some(json!({ "circuitId": ready_circuit.id.to_hex(), "status": "error" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Failed);
    assert_eq!(circuit.error.as_deref(), Some("Deployment failed (webhook notification)"));
}

#[rstest]
#[tokio::test]
async fn deployed_notification_records_the_contract(mut ready_circuit: Circuit) {
    ready_circuit.status = CircuitStatus::Deploying;
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, _) = send(
        services.config.clone(),
        Method::POST,
        WEBHOOK,
        Some(json!({
            "circuitId": ready_circuit.id.to_hex(),
            "status": "deployed",
            "contractAddress": "0x5FbDB2315678afecb367f032d93F642f64180aa3",
            "txHash": "0xabc",
            "deployedAt": "2024-05-01T10:00:00Z",
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Deployed);
    let deployment = circuit.deployment.unwrap();
    assert_eq!(deployment.contract_address.as_deref(), Some("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
    assert_eq!(deployment.tx_hash.as_deref(), Some("0xabc"));
}

#[rstest]
#[tokio::test]
async fn notifications_never_touch_terminal_circuits(mut ready_circuit: Circuit) {
    ready_circuit.status = CircuitStatus::Deployed;
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        WEBHOOK,
        Some(json!({ "circuitId": ready_circuit.id.to_hex(), "status": "failed", "error": "late" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Status update processed");
    assert_eq!(database.circuit(ready_circuit.id), ready_circuit);
}

#[rstest]
#[tokio::test]
async fn unknown_statuses_are_ignored(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let services = TestConfigBuilder::new().mock_db_client(database.mock()).build();

    let (status, _) = send(
        services.config.clone(),
        Method::POST,
        WEBHOOK,
        Some(json!({ "circuitId": ready_circuit.id.to_hex(), "status": "processing" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(database.circuit(ready_circuit.id), ready_circuit);
}

#[rstest]
#[tokio::test]
async fn webhook_validates_the_circuit() {
    let services = TestConfigBuilder::new().mock_db_client(InMemoryDatabase::default().mock()).build();

    let (status, body) =
        send(services.config.clone(), Method::POST, WEBHOOK, Some(json!({ "status": "deployed" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, error_body("circuitId is required"));

    let (status, body) = send(
        services.config.clone(),
        Method::POST,
        WEBHOOK,
        Some(json!({ "circuitId": ObjectId::new().to_hex(), "status": "deployed" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, error_body("Circuit not found"));
}
