pub mod migrate;

use crate::cli::SetupCmd;
use crate::core::client::database::DatabaseClient;
use crate::core::client::{MongoDbClient, AWSS3, SQS};
use crate::core::cloud::CloudProvider;
use crate::types::params::database::DatabaseArgs;
use crate::types::params::{AWSConfigParams, QueueArgs, StorageArgs};
use crate::types::queue::QueueType;
use crate::types::queue_control::QUEUES;
use crate::{OrchestratorError, OrchestratorResult};
use strum::IntoEnumIterator;
use tracing::{debug, info};

/// Setup function that initializes all necessary resources: the artifact bucket,
/// one queue per job type and the database indexes. Safe to run more than once.
pub async fn setup(setup_cmd: &SetupCmd) -> OrchestratorResult<()> {
    let aws_params = AWSConfigParams::from(setup_cmd.aws_config_args.clone());
    let cloud_provider = CloudProvider::from_params(&aws_params).await;
    info!(provider = %cloud_provider.get_provider_name(), "Setting up resources for Orchestrator...");

    let storage_params = StorageArgs::try_from(setup_cmd.clone())?;
    let queue_params = QueueArgs::try_from(setup_cmd.clone())?;
    debug!("Queue Params: {:?}", queue_params);
    debug!("Storage Params: {:?}", storage_params);

    let aws_config = cloud_provider.get_aws_config();
    AWSS3::new(aws_config, &storage_params).setup_bucket().await?;
    setup_queues(&SQS::new(aws_config, &queue_params)).await?;

    let database_args: DatabaseArgs = setup_cmd.mongodb_args.clone().into();
    let database = MongoDbClient::new(&database_args).await?;
    database.create_indexes().await?;
    info!(database = %database_args.database_name, "Database indexes created");

    Ok(())
}

/// Create every missing queue with the visibility timeout of its job type
async fn setup_queues(sqs: &SQS) -> OrchestratorResult<()> {
    for queue_type in QueueType::iter() {
        let queue_name = sqs.get_queue_name(&queue_type);
        if sqs.inner.get_queue_url_from_client(&queue_name).await.is_ok() {
            info!(queue = %queue_name, "SQS queue already exists, skipping creation");
            continue;
        }

        let queue_config = QUEUES
            .get(&queue_type)
            .ok_or_else(|| OrchestratorError::SetupError(format!("No configuration for queue {}", queue_type)))?;
        let queue_url = sqs.inner.create_queue(queue_name.clone(), queue_config.visibility_timeout).await?;
        info!(queue = %queue_name, url = %queue_url, "SQS queue created");
    }
    Ok(())
}
