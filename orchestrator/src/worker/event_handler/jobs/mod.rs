pub mod cleanup;
pub mod deployment;
pub mod key_generation;
pub mod legacy_deploy;
pub mod proof_generation;

use std::sync::Arc;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use tracing::warn;

use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::types::jobs::JobMessage;
use crate::utils::scratch::ScratchDir;
use crate::worker::service::JobService;

/// One implementation per queue.
///
/// `process_job` runs a single attempt. The caller decides from the returned error whether the
/// job is retried, and tells the handler through `on_failure` so it can record the outcome on
/// the entity it owns.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandlerTrait: Send + Sync {
    async fn process_job(&self, config: Arc<Config>, message: &JobMessage) -> JobResult<()>;

    /// Called after a failed attempt. `final_attempt` is true when no retry will follow.
    async fn on_failure(
        &self,
        config: Arc<Config>,
        message: &JobMessage,
        error: &JobError,
        final_attempt: bool,
    ) -> JobResult<()>;
}

pub(crate) fn parse_entity_id(entity: &'static str, id: &str) -> JobResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| JobError::NotFound { entity, id: id.to_string() })
}

/// Remove a scratch workspace. A failure never fails the job: it is logged and handed to the cleanup queue.
pub(crate) async fn release_scratch(config: &Config, scratch: ScratchDir) {
    if let Err((path, error)) = scratch.remove().await {
        warn!(path = %path.display(), error = %error, "Failed to remove scratch workspace, scheduling cleanup");
        if let Err(e) = JobService::enqueue_cleanup(config, path).await {
            warn!(error = %e, "Failed to schedule scratch workspace cleanup");
        }
    }
}
