pub mod controller;
pub mod event_handler;
pub mod parser;
pub mod service;
pub mod traits;

use controller::worker_controller::WorkerController;

use crate::{core::config::Config, OrchestratorResult};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Initializes the queue workers with the provided configuration
///
/// The workers run in the background. The returned controller is used for shutdown.
/// An infrastructure failure in any worker cancels `shutdown_token`, taking the process down.
pub async fn initialize_worker(
    config: Arc<Config>,
    shutdown_token: CancellationToken,
) -> OrchestratorResult<WorkerController> {
    let controller = WorkerController::new(config, shutdown_token.child_token());
    info!(queues = ?controller.queues(), "Starting workers");

    let running = controller.clone();
    tokio::spawn(async move {
        if let Err(e) = running.run().await {
            error!(error = %e, "Workers stopped with an error, shutting down");
            shutdown_token.cancel();
        }
    });

    Ok(controller)
}
