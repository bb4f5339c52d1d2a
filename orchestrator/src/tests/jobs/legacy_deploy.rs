use rstest::*;
use url::Url;

use super::{is_empty_dir, message_at};
use crate::core::client::deployer::{DeployedContract, DeployerError, MockContractDeployer};
use crate::core::client::toolchain::MockCircuitToolchain;
use crate::tests::common::{ready_circuit, store_circuit_artifacts, InMemoryDatabase, InMemoryStorage, RecordingQueue};
use crate::tests::config::TestConfigBuilder;
use crate::types::circuit::{Circuit, CircuitStatus, LegacyDeployment};
use crate::types::constant::LEGACY_VERIFIER_FILE;
use crate::types::jobs::{JobMessage, JobPayload, LegacyDeployPayload};
use crate::worker::event_handler::jobs::legacy_deploy::LegacyDeployJobHandler;
use crate::worker::event_handler::jobs::JobHandlerTrait;
use crate::worker::event_handler::service::JobHandlerService;

const PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

fn legacy_message(circuit: &Circuit, attempt: u32) -> JobMessage {
    message_at(
        JobPayload::LegacyDeploy(LegacyDeployPayload {
            circuit_id: circuit.id.to_hex(),
            artifacts: circuit.artifacts.clone().unwrap(),
            chain_id: Some(11155111),
            rpc_url: Url::parse("http://localhost:8545").unwrap(),
            private_key: PRIVATE_KEY.to_string(),
        }),
        attempt,
    )
}

fn compiling_toolchain() -> MockCircuitToolchain {
    let mut toolchain = MockCircuitToolchain::new();
    toolchain.expect_compile_contract().times(1).returning(|source| {
        assert!(source.ends_with(LEGACY_VERIFIER_FILE));
        assert_eq!(std::fs::read_to_string(source)?, "contract Groth16Verifier {}");
        Ok(vec![0x60, 0x80, 0x60, 0x40])
    });
    toolchain
}

#[rstest]
#[tokio::test]
async fn verifier_is_deployed_and_recorded(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let storage = InMemoryStorage::default();
    store_circuit_artifacts(&storage, &ready_circuit);

    let mut deployer = MockContractDeployer::new();
    deployer
        .expect_deploy_contract()
        .withf(|rpc_url, private_key, bytecode| {
            rpc_url.as_str() == "http://localhost:8545/" && private_key == PRIVATE_KEY && bytecode == &vec![0x60, 0x80, 0x60, 0x40]
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(DeployedContract {
                address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
                tx_hash: "0xdeadbeef".to_string(),
                block_number: 42,
                chain_id: 11155111,
            })
        });

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_storage_client(storage.mock())
        .mock_toolchain(compiling_toolchain())
        .mock_deployer(deployer)
        .build();

    LegacyDeployJobHandler.process_job(services.config.clone(), &legacy_message(&ready_circuit, 1)).await.unwrap();

    let circuit = database.circuit(ready_circuit.id);
    // the direct path never moves the status machine
    assert_eq!(circuit.status, CircuitStatus::ReadyForDeployment);
    assert_eq!(
        circuit.artifacts.unwrap().deployment,
        Some(LegacyDeployment {
            address: "0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string(),
            chain_id: 11155111,
            tx_hash: "0xdeadbeef".to_string(),
            block_number: 42,
            network: "sepolia".to_string(),
        })
    );
    assert_eq!(circuit.deployment, None);
    assert!(is_empty_dir(services.processing_dir.path()));
}

#[rstest]
#[tokio::test]
async fn failed_deployment_leaves_the_circuit_unchanged(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let storage = InMemoryStorage::default();
    store_circuit_artifacts(&storage, &ready_circuit);
    let queue = RecordingQueue::default();

    let mut deployer = MockContractDeployer::new();
    deployer
        .expect_deploy_contract()
        .times(1)
        .returning(|_, _, _| Err(DeployerError::Rpc("insufficient funds for gas".to_string())));

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_queue(queue.mock())
        .mock_storage_client(storage.mock())
        .mock_toolchain(compiling_toolchain())
        .mock_deployer(deployer)
        .build();

    JobHandlerService::handle_job_with(&LegacyDeployJobHandler, services.config.clone(), &legacy_message(&ready_circuit, 2))
        .await
        .unwrap();

    assert_eq!(database.circuit(ready_circuit.id), ready_circuit);
    assert!(queue.sent().is_empty());
    assert!(is_empty_dir(services.processing_dir.path()));
}
