use std::path::Component;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, instrument};

use super::JobHandlerTrait;
use crate::core::config::Config;
use crate::error::job::{JobError, JobResult};
use crate::types::jobs::{JobMessage, JobPayload};
use crate::utils::scratch::remove_path;

/// Removes leftovers of scratch workspaces whose inline removal failed.
pub struct CleanupJobHandler;

#[async_trait]
impl JobHandlerTrait for CleanupJobHandler {
    #[instrument(skip_all, fields(path = tracing::field::Empty))]
    async fn process_job(&self, config: Arc<Config>, message: &JobMessage) -> JobResult<()> {
        let JobPayload::Cleanup(payload) = &message.payload else {
            return Err(JobError::Validation(format!(
                "Expected a cleanup payload, got {:?}",
                message.payload.queue_type()
            )));
        };
        tracing::Span::current().record("path", payload.path.display().to_string().as_str());

        // only scratch workspaces are ever cleaned up
        let escapes = payload.path.components().any(|component| matches!(component, Component::ParentDir));
        if escapes || !payload.path.starts_with(&config.pipeline_config().processing_dir) {
            return Err(JobError::Validation(format!(
                "Refusing to remove {} outside the processing directory",
                payload.path.display()
            )));
        }

        remove_path(&payload.path).await?;
        info!("Removed scratch workspace");
        Ok(())
    }

    async fn on_failure(
        &self,
        _config: Arc<Config>,
        message: &JobMessage,
        error: &JobError,
        _final_attempt: bool,
    ) -> JobResult<()> {
        tracing::warn!(job_key = %message.job_key, error = %error, "Cleanup failed, path left in place");
        Ok(())
    }
}
