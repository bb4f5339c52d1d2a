use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use rstest::*;
use zkflow_deployment_service::{
    ContractInfo, DeploymentJobStatus, DeploymentService, DeploymentServiceError, DeploymentState,
    MockDeploymentService,
};

use super::message_at;
use crate::error::job::JobError;
use crate::tests::common::{pending_circuit, ready_circuit, InMemoryDatabase, RecordingQueue};
use crate::tests::config::{fast_deployment_poll, TestConfigBuilder};
use crate::types::circuit::{Circuit, CircuitStatus};
use crate::types::jobs::{DeploymentPayload, JobMessage, JobPayload};
use crate::types::queue::QueueType;
use crate::worker::event_handler::jobs::deployment::DeploymentJobHandler;
use crate::worker::event_handler::jobs::JobHandlerTrait;
use crate::worker::event_handler::service::JobHandlerService;

fn deployment_message(circuit: &Circuit, attempt: u32) -> JobMessage {
    message_at(JobPayload::Deployment(DeploymentPayload { circuit_id: circuit.id.to_hex() }), attempt)
}

fn status(state: DeploymentState) -> DeploymentJobStatus {
    DeploymentJobStatus { state, error: None }
}

fn deployed_contract() -> ContractInfo {
    ContractInfo {
        state: DeploymentState::Deployed,
        contract_address: Some("0x5FbDB2315678afecb367f032d93F642f64180aa3".to_string()),
        tx_hash: Some("0xabc".to_string()),
        deployed_at: Some("2024-05-01T10:00:00Z".to_string()),
    }
}

/// Deployment service that accepts the start request with job id `job-1`
fn started_service(circuit: &Circuit) -> MockDeploymentService {
    let mut service = MockDeploymentService::new();
    let circuit_id = circuit.id.to_hex();
    service
        .expect_start_deployment()
        .withf(move |id| id == circuit_id)
        .times(1)
        .returning(|_| Ok("job-1".to_string()));
    service
}

/// Deployment service with slow calls, for runs that interleave
#[derive(Clone, Default)]
struct SlowDeploymentService {
    start_delay: Duration,
    status_delay: Duration,
    /// Status check on which the job reports `completed`, never when `None`
    completes_on_check: Option<u32>,
    starts: Arc<AtomicU32>,
    status_checks: Arc<AtomicU32>,
}

#[async_trait]
impl DeploymentService for SlowDeploymentService {
    async fn start_deployment(&self, _circuit_id: &str) -> Result<String, DeploymentServiceError> {
        let start = self.starts.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.start_delay).await;
        match start {
            1 => Ok("job-a".to_string()),
            _ => Err(DeploymentServiceError::Rejected {
                operation: "start_deployment".to_string(),
                message: "busy".to_string(),
            }),
        }
    }

    async fn get_deployment_status(&self, _job_id: &str) -> Result<DeploymentJobStatus, DeploymentServiceError> {
        let check = self.status_checks.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.status_delay).await;
        match self.completes_on_check {
            Some(on) if check >= on => Ok(status(DeploymentState::Completed)),
            _ => Ok(status(DeploymentState::Processing)),
        }
    }

    async fn get_contract_info(&self, _circuit_id: &str) -> Result<ContractInfo, DeploymentServiceError> {
        Ok(deployed_contract())
    }

    async fn health_check(&self) -> Result<(), DeploymentServiceError> {
        Ok(())
    }
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn deployment_completes_on_third_status_check(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let checks = Arc::new(AtomicU32::new(0));

    let mut service = started_service(&ready_circuit);
    let counter = checks.clone();
    service.expect_get_deployment_status().withf(|job_id| job_id == "job-1").returning(move |_| {
        match counter.fetch_add(1, Ordering::SeqCst) {
            0 | 1 => Ok(status(DeploymentState::Processing)),
            _ => Ok(status(DeploymentState::Completed)),
        }
    });
    let circuit_hex = ready_circuit.id.to_hex();
    service
        .expect_get_contract_info()
        .withf(move |id| id == circuit_hex)
        .times(1)
        .returning(|_| Ok(deployed_contract()));

    let services =
        TestConfigBuilder::new().mock_db_client(database.mock()).mock_deployment_service(service).build();

    DeploymentJobHandler.process_job(services.config.clone(), &deployment_message(&ready_circuit, 1)).await.unwrap();

    assert_eq!(checks.load(Ordering::SeqCst), 3);
    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Deployed);
    let deployment = circuit.deployment.unwrap();
    assert_eq!(deployment.job_id.as_deref(), Some("job-1"));
    assert_eq!(deployment.contract_address.as_deref(), Some("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
    assert_eq!(deployment.tx_hash.as_deref(), Some("0xabc"));
    assert_eq!(deployment.deployed_at.unwrap().to_chrono().to_rfc3339(), "2024-05-01T10:00:00+00:00");
    assert_eq!(deployment.error, None);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn deployment_times_out_after_the_poll_budget(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let queue = RecordingQueue::default();

    let mut service = started_service(&ready_circuit);
    service.expect_get_deployment_status().times(60).returning(|_| Ok(status(DeploymentState::Processing)));
    service.expect_get_contract_info().never();

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_queue(queue.mock())
        .mock_deployment_service(service)
        .build();

    // last attempt of the queue policy
    JobHandlerService::handle_job_with(&DeploymentJobHandler, services.config.clone(), &deployment_message(&ready_circuit, 2))
        .await
        .unwrap();

    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Failed);
    assert_eq!(circuit.error.as_deref(), Some("Deployment timed out after 60 attempts"));
    assert_eq!(circuit.deployment.unwrap().error.as_deref(), Some("Deployment timed out after 60 attempts"));
    assert!(queue.sent().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn provider_failure_releases_the_circuit_for_a_retry(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let queue = RecordingQueue::default();

    let mut service = started_service(&ready_circuit);
    service.expect_get_deployment_status().times(1).returning(|_| {
        Ok(DeploymentJobStatus { state: DeploymentState::Failed, error: Some("insufficient gas".to_string()) })
    });

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_queue(queue.mock())
        .mock_deployment_service(service)
        .build();

    JobHandlerService::handle_job_with(&DeploymentJobHandler, services.config.clone(), &deployment_message(&ready_circuit, 1))
        .await
        .unwrap();

    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::ReadyForDeployment);
    let deployment = circuit.deployment.unwrap();
    assert_eq!(deployment.job_id.as_deref(), Some("job-1"));
    assert_eq!(deployment.error.as_deref(), Some("Deployment failed: insufficient gas"));

    let retries = queue.sent_to(QueueType::Deployment);
    assert_eq!(retries.len(), 1);
    assert_eq!(retries[0].message.attempt, 2);
    assert_eq!(retries[0].delay, Some(Duration::from_secs(10)));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn status_errors_in_the_final_window_are_fatal(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());

    let mut service = started_service(&ready_circuit);
    // attempt 1 is tolerated, attempt 2 falls in the final window
    service.expect_get_deployment_status().times(2).returning(|_| {
        Err(DeploymentServiceError::NetworkError {
            operation: "get_deployment_status".to_string(),
            message: "connection refused".to_string(),
        })
    });

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_deployment_service(service)
        .configure_deployment_poll(fast_deployment_poll())
        .build();

    let result = DeploymentJobHandler.process_job(services.config.clone(), &deployment_message(&ready_circuit, 1)).await;

    assert_matches!(
        result,
        Err(JobError::ExternalServiceFailure(message))
            if message == "Deployment status check failed: Network error during get_deployment_status: connection refused"
    );
    // the claim is handed back for the next attempt
    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::ReadyForDeployment);
    let deployment = circuit.deployment.unwrap();
    assert_eq!(deployment.job_id.as_deref(), Some("job-1"));
    assert_eq!(
        deployment.error.as_deref(),
        Some("Deployment status check failed: Network error during get_deployment_status: connection refused")
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn contract_info_errors_in_the_final_window_are_fatal(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());

    let mut service = started_service(&ready_circuit);
    service.expect_get_deployment_status().times(1).returning(|_| Ok(status(DeploymentState::Completed)));
    service.expect_get_contract_info().times(2).returning(|_| {
        Err(DeploymentServiceError::NetworkError {
            operation: "get_contract_info".to_string(),
            message: "connection refused".to_string(),
        })
    });

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_deployment_service(service)
        .configure_deployment_poll(fast_deployment_poll())
        .build();

    let result = DeploymentJobHandler.process_job(services.config.clone(), &deployment_message(&ready_circuit, 1)).await;

    assert_matches!(
        result,
        Err(JobError::ExternalServiceFailure(message))
            if message == "Contract info check failed: Network error during get_contract_info: connection refused"
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn slow_status_checks_time_out_with_the_attempts_that_ran(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    // 25s per check plus the 10s interval against a 600s budget
    let service = SlowDeploymentService { status_delay: Duration::from_secs(25), ..Default::default() };
    let checks = service.status_checks.clone();

    let services =
        TestConfigBuilder::new().mock_db_client(database.mock()).deployment_service(service).build();

    let result = DeploymentJobHandler.process_job(services.config.clone(), &deployment_message(&ready_circuit, 1)).await;

    assert_eq!(checks.load(Ordering::SeqCst), 18);
    assert_matches!(
        result,
        Err(JobError::ExternalServiceFailure(message)) if message == "Deployment timed out after 18 attempts"
    );
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn concurrent_jobs_start_a_single_deployment(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let service = SlowDeploymentService {
        start_delay: Duration::from_millis(50),
        completes_on_check: Some(1),
        ..Default::default()
    };
    let starts = service.starts.clone();

    let services =
        TestConfigBuilder::new().mock_db_client(database.mock()).deployment_service(service).build();

    let message = deployment_message(&ready_circuit, 1);
    let (first, second) = tokio::join!(
        DeploymentJobHandler.process_job(services.config.clone(), &message),
        DeploymentJobHandler.process_job(services.config.clone(), &message),
    );

    assert_eq!(starts.load(Ordering::SeqCst), 1);
    let conflicts = [&first, &second].into_iter().filter(|result| matches!(result, Err(JobError::StateConflict(_)))).count();
    assert_eq!(conflicts, 1);
    assert!(first.is_ok() || second.is_ok());
    assert_eq!(database.circuit(ready_circuit.id).status, CircuitStatus::Deployed);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn failed_duplicate_job_leaves_the_running_deployment_alone(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let queue = RecordingQueue::default();
    let service = SlowDeploymentService {
        start_delay: Duration::from_millis(10),
        completes_on_check: Some(3),
        ..Default::default()
    };
    let starts = service.starts.clone();

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_queue(queue.mock())
        .deployment_service(service)
        .build();

    let winner = deployment_message(&ready_circuit, 1);
    let duplicate = deployment_message(&ready_circuit, 1);
    let (first, second) = tokio::join!(
        JobHandlerService::handle_job_with(&DeploymentJobHandler, services.config.clone(), &winner),
        async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            JobHandlerService::handle_job_with(&DeploymentJobHandler, services.config.clone(), &duplicate).await
        },
    );
    first.unwrap();
    second.unwrap();

    assert_eq!(starts.load(Ordering::SeqCst), 1);
    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Deployed);
    let deployment = circuit.deployment.unwrap();
    assert_eq!(deployment.job_id.as_deref(), Some("job-a"));
    assert_eq!(deployment.contract_address.as_deref(), Some("0x5FbDB2315678afecb367f032d93F642f64180aa3"));
    assert!(queue.sent().is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn deployment_result_is_not_dropped_when_the_circuit_moved_on(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());

    let mut service = started_service(&ready_circuit);
    let moved = database.clone();
    let circuit_id = ready_circuit.id;
    service.expect_get_deployment_status().times(1).returning(move |_| {
        // another writer settles the circuit while the job is polling
        moved.set_status(circuit_id, CircuitStatus::Failed);
        Ok(status(DeploymentState::Completed))
    });
    service.expect_get_contract_info().times(1).returning(|_| Ok(deployed_contract()));

    let services =
        TestConfigBuilder::new().mock_db_client(database.mock()).mock_deployment_service(service).build();

    let result = DeploymentJobHandler.process_job(services.config.clone(), &deployment_message(&ready_circuit, 1)).await;

    assert_matches!(
        result,
        Err(JobError::StateConflict(message)) if message.contains("0x5FbDB2315678afecb367f032d93F642f64180aa3")
    );
    assert_eq!(database.circuit(ready_circuit.id).status, CircuitStatus::Failed);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn completed_job_without_contract_info_fails(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());

    let mut service = started_service(&ready_circuit);
    service.expect_get_deployment_status().times(1).returning(|_| Ok(status(DeploymentState::Completed)));
    service.expect_get_contract_info().times(2).returning(|_| {
        Ok(ContractInfo { state: DeploymentState::Pending, contract_address: None, tx_hash: None, deployed_at: None })
    });

    let services = TestConfigBuilder::new()
        .mock_db_client(database.mock())
        .mock_deployment_service(service)
        .configure_deployment_poll(fast_deployment_poll())
        .build();

    let result = DeploymentJobHandler.process_job(services.config.clone(), &deployment_message(&ready_circuit, 1)).await;

    assert_matches!(
        result,
        Err(JobError::ExternalServiceFailure(message))
            if message == "Contract info not available after 2 attempts. Job status was completed but contract not deployed."
    );
}

#[rstest]
#[tokio::test]
async fn pending_circuit_is_never_deployed(pending_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(pending_circuit.clone());
    let mut service = MockDeploymentService::new();
    service.expect_start_deployment().never();

    let services =
        TestConfigBuilder::new().mock_db_client(database.mock()).mock_deployment_service(service).build();

    JobHandlerService::handle_job_with(&DeploymentJobHandler, services.config.clone(), &deployment_message(&pending_circuit, 1))
        .await
        .unwrap();

    let circuit = database.circuit(pending_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Pending);
    assert_eq!(circuit.error, None);
}

#[rstest]
#[tokio::test]
async fn rejected_start_on_the_last_attempt_fails_the_circuit(ready_circuit: Circuit) {
    let database = InMemoryDatabase::with_circuit(ready_circuit.clone());
    let mut service = MockDeploymentService::new();
    service.expect_start_deployment().times(1).returning(|_| {
        Err(DeploymentServiceError::Rejected {
            operation: "start_deployment".to_string(),
            message: "circuit unknown".to_string(),
        })
    });

    let services =
        TestConfigBuilder::new().mock_db_client(database.mock()).mock_deployment_service(service).build();

    JobHandlerService::handle_job_with(&DeploymentJobHandler, services.config.clone(), &deployment_message(&ready_circuit, 2))
        .await
        .unwrap();

    let circuit = database.circuit(ready_circuit.id);
    assert_eq!(circuit.status, CircuitStatus::Failed);
    assert_eq!(circuit.error.as_deref(), Some("Deployment API returned error: circuit unknown"));
}
