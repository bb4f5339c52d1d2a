use std::time::Duration;

use rstest::*;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;

use crate::core::client::queue::{MockQueueClient, QueueError};
use crate::tests::config::TestConfigBuilder;
use crate::types::params::service::ServiceParams;
use crate::types::queue::QueueType;
use crate::worker::controller::event_worker::EventWorker;
use crate::worker::controller::worker_controller::WorkerController;
use crate::worker::initialize_worker;

/// A broker that never has anything to hand out
fn idle_queue() -> MockQueueClient {
    let mut queue = MockQueueClient::new();
    queue
        .expect_consume_message_from_queue()
        .returning(|_| Err(QueueError::ErrorFromQueueError(omniqueue::QueueError::NoData)));
    queue
}

fn service_params(workers_enabled: bool) -> ServiceParams {
    ServiceParams { workers_enabled, ..Default::default() }
}

#[rstest]
#[case(true, QueueType::iter().collect())]
#[case(false, vec![])]
fn controller_consumes_every_queue_unless_disabled(#[case] enabled: bool, #[case] expected: Vec<QueueType>) {
    let services = TestConfigBuilder::new().configure_service(service_params(enabled)).build();

    let controller = WorkerController::new(services.config.clone(), CancellationToken::new());

    assert_eq!(controller.queues(), expected);
}

#[rstest]
#[tokio::test]
async fn disabled_workers_return_immediately() {
    let services = TestConfigBuilder::new().configure_service(service_params(false)).build();
    let controller = WorkerController::new(services.config.clone(), CancellationToken::new());

    controller.run().await.unwrap();

    assert!(controller.workers().unwrap().is_empty());
}

#[rstest]
#[case(QueueType::Deployment, None, 2)]
#[case(QueueType::Deployment, Some(4), 4)]
#[case(QueueType::KeyGeneration, Some(0), 1)]
fn worker_pool_size_follows_the_service_config(
    #[case] queue: QueueType,
    #[case] deployment_or_keygen: Option<usize>,
    #[case] expected: usize,
) {
    let params = match queue {
        QueueType::KeyGeneration => ServiceParams { keygen_concurrency: deployment_or_keygen, ..Default::default() },
        _ => ServiceParams { deployment_concurrency: deployment_or_keygen, ..Default::default() },
    };
    let services = TestConfigBuilder::new().configure_service(params).build();

    let worker = EventWorker::new(queue, services.config.clone(), CancellationToken::new()).unwrap();

    assert_eq!(worker.queue_type(), queue);
    assert_eq!(worker.max_concurrent_tasks(), expected);
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn controller_starts_one_worker_per_queue_and_stops_on_shutdown() {
    let services = TestConfigBuilder::new().mock_queue(idle_queue()).build();
    let controller = WorkerController::new(services.config.clone(), CancellationToken::new());

    let running = controller.clone();
    let handle = tokio::spawn(async move { running.run().await });
    tokio::time::sleep(Duration::from_secs(5)).await;

    let mut started: Vec<QueueType> = controller.workers().unwrap().iter().map(|worker| worker.queue_type()).collect();
    started.sort_by_key(|queue| queue.to_string());
    let mut expected: Vec<QueueType> = QueueType::iter().collect();
    expected.sort_by_key(|queue| queue.to_string());
    assert_eq!(started, expected);

    controller.shutdown().await.unwrap();
    handle.await.unwrap().unwrap();
    assert!(controller.workers().unwrap().iter().all(|worker| worker.is_shutdown_requested()));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn initialized_workers_stop_with_the_process_token() {
    let services = TestConfigBuilder::new().mock_queue(idle_queue()).build();
    let shutdown = CancellationToken::new();

    let controller = initialize_worker(services.config.clone(), shutdown.clone()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(controller.workers().unwrap().len(), QueueType::iter().count());

    shutdown.cancel();
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(controller.workers().unwrap().iter().all(|worker| worker.is_shutdown_requested()));
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn broker_failures_do_not_stop_the_worker() {
    let mut queue = MockQueueClient::new();
    queue
        .expect_consume_message_from_queue()
        .returning(|_| Err(QueueError::FailedToGetQueueUrl("deployment".to_string())));
    let services = TestConfigBuilder::new().mock_queue(queue).build();
    let token = CancellationToken::new();
    let worker = EventWorker::new(QueueType::Deployment, services.config.clone(), token.clone()).unwrap();

    let running = worker.clone();
    let handle = tokio::spawn(async move { running.run().await });
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(!handle.is_finished());

    worker.shutdown().await.unwrap();
    handle.await.unwrap().unwrap();
}
