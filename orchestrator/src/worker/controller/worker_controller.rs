use crate::core::config::Config;
use crate::error::event::EventSystemError;
use crate::error::event::EventSystemResult;
use crate::error::ConsumptionError;
use crate::types::queue::QueueType;
use crate::worker::controller::event_worker::EventWorker;

use futures::future::try_join_all;
use std::sync::Arc;
use std::sync::Mutex;
use strum::IntoEnumIterator;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

/// Runs one [`EventWorker`] per queue and coordinates their shutdown.
#[derive(Clone)]
pub struct WorkerController {
    config: Arc<Config>,
    workers: Arc<Mutex<Vec<Arc<EventWorker>>>>,
    cancellation_token: CancellationToken,
}

impl WorkerController {
    pub fn new(config: Arc<Config>, cancellation_token: CancellationToken) -> Self {
        Self { config, workers: Arc::new(Mutex::new(Vec::new())), cancellation_token }
    }

    /// workers - The workers started so far
    pub fn workers(&self) -> EventSystemResult<Vec<Arc<EventWorker>>> {
        let workers = self.workers.lock().map_err(|e| EventSystemError::MutexPoisonError(e.to_string()))?;
        Ok(workers.clone())
    }

    /// Queues this process consumes. Empty when workers are disabled, which leaves an API-only process.
    pub fn queues(&self) -> Vec<QueueType> {
        if self.config.service_config().workers_enabled {
            QueueType::iter().collect()
        } else {
            Vec::new()
        }
    }

    /// run - Spawn a worker per queue and wait for all of them
    /// Returns once every worker stopped, which only happens on shutdown or on an
    /// infrastructure error in one of them.
    pub async fn run(&self) -> EventSystemResult<()> {
        let queues = self.queues();
        if queues.is_empty() {
            info!("Workers disabled, no queue will be consumed");
            return Ok(());
        }

        let mut worker_set = tokio::task::JoinSet::new();
        for queue_type in queues {
            let self_clone = self.clone();
            worker_set.spawn(async move { self_clone.create_span(queue_type).await });
        }
        while let Some(result) = worker_set.join_next().await {
            // a failing worker takes the process down
            let worker_result = result.map_err(|e| ConsumptionError::Other(format!("Worker task failed: {}", e)))?;
            worker_result?;
        }
        Ok(())
    }

    fn create_event_handler(&self, queue_type: QueueType) -> EventSystemResult<Arc<EventWorker>> {
        let worker_token = self.cancellation_token.child_token();
        let worker = Arc::new(EventWorker::new(queue_type, self.config.clone(), worker_token)?);

        let mut workers = self.workers.lock().map_err(|e| EventSystemError::MutexPoisonError(e.to_string()))?;
        if workers.iter().any(|existing| existing.queue_type() == queue_type) {
            return Err(EventSystemError::EventHandlerAlreadyExisting(queue_type));
        }
        workers.push(worker.clone());
        Ok(worker)
    }

    /// Start the worker of `q` inside a `worker` span. Every log line of its jobs carries the queue.
    async fn create_span(&self, q: QueueType) -> EventSystemResult<()> {
        let span = info_span!("worker", q = %q);

        async move {
            let handler = match self.create_event_handler(q) {
                Ok(handler) => handler,
                Err(e) => {
                    error!("Failed to create handler for queue type {}: {:?}", q, e);
                    return Err(e);
                }
            };

            match handler.run().await {
                Ok(_) => {
                    warn!("Worker for queue type {} stopped", q);
                    Ok(())
                }
                Err(e) => {
                    error!("Worker for queue type {} failed with infrastructure error: {:?}", q, e);
                    Err(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// shutdown - Signal every worker to stop. In-flight jobs are allowed to finish.
    pub async fn shutdown(&self) -> EventSystemResult<()> {
        info!("Initiating WorkerController graceful shutdown");

        let workers = self.workers()?;
        info!("Signaling {} workers to shutdown gracefully", workers.len());

        let futures: Vec<_> = workers.iter().map(|worker| worker.shutdown()).collect();
        try_join_all(futures).await?;
        self.cancellation_token.cancel();
        info!("WorkerController shutdown completed");
        Ok(())
    }
}
