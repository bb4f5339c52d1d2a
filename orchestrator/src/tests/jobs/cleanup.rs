use std::path::PathBuf;

use assert_matches::assert_matches;
use rstest::*;

use super::{is_empty_dir, message_at};
use crate::error::job::JobError;
use crate::tests::config::TestConfigBuilder;
use crate::types::jobs::{CleanupPayload, JobMessage, JobPayload};
use crate::worker::event_handler::jobs::cleanup::CleanupJobHandler;
use crate::worker::event_handler::jobs::JobHandlerTrait;
use crate::worker::event_handler::service::JobHandlerService;

fn cleanup_message(path: PathBuf) -> JobMessage {
    message_at(JobPayload::Cleanup(CleanupPayload { path }), 1)
}

#[rstest]
#[tokio::test]
async fn scratch_workspace_is_removed() {
    let services = TestConfigBuilder::new().build();
    let workspace = services.processing_dir.path().join("65f1c0a2b3c4d5e6f7a8b9c0");
    std::fs::create_dir_all(workspace.join("circuit_js")).unwrap();
    std::fs::write(workspace.join("circuit_js").join("circuit.wasm"), b"wasm").unwrap();

    CleanupJobHandler.process_job(services.config.clone(), &cleanup_message(workspace.clone())).await.unwrap();

    assert!(!workspace.exists());
    assert!(is_empty_dir(services.processing_dir.path()));
}

#[rstest]
#[tokio::test]
async fn missing_path_is_not_an_error() {
    let services = TestConfigBuilder::new().build();
    let workspace = services.processing_dir.path().join("already-gone");

    CleanupJobHandler.process_job(services.config.clone(), &cleanup_message(workspace)).await.unwrap();
}

#[rstest]
#[tokio::test]
async fn paths_outside_the_processing_directory_are_refused() {
    let services = TestConfigBuilder::new().build();
    let outside = tempfile::tempdir().unwrap();

    let result = CleanupJobHandler.process_job(services.config.clone(), &cleanup_message(outside.path().to_path_buf())).await;
    assert_matches!(result, Err(JobError::Validation(_)));

    // a single attempt, the failure is only logged
    JobHandlerService::handle_job_with(&CleanupJobHandler, services.config.clone(), &cleanup_message(outside.path().to_path_buf()))
        .await
        .unwrap();
    assert!(outside.path().exists());
}

#[rstest]
#[tokio::test]
async fn parent_components_cannot_escape_the_processing_directory() {
    let services = TestConfigBuilder::new().build();
    let sibling = tempfile::tempdir_in(services.processing_dir.path().parent().unwrap()).unwrap();
    let name = sibling.path().file_name().unwrap();
    let escaping = services.processing_dir.path().join("..").join(name);

    let result = CleanupJobHandler.process_job(services.config.clone(), &cleanup_message(escaping)).await;

    assert_matches!(result, Err(JobError::Validation(message)) if message.starts_with("Refusing to remove"));
    assert!(sibling.path().exists());
}
