pub mod database;
pub mod deployment;
pub mod otel;
pub mod pipeline;
pub mod service;

use url::Url;

use crate::cli::provider::aws::AWSConfigCliArgs;
use crate::cli::queue::aws_sqs::AWSSQSCliArgs;
use crate::cli::storage::aws_s3::AWSS3CliArgs;
use crate::cli::{RunCmd, SetupCmd};
use crate::OrchestratorError;

/// StorageArgs - Arguments used to setup storage resources
#[derive(Debug, Clone)]
pub struct StorageArgs {
    pub bucket_name: String,
}

/// QueueArgs - Arguments used to setup queue resources
#[derive(Debug, Clone)]
pub struct QueueArgs {
    /// Queue name template, `{}` is replaced by the queue type
    pub queue_template: String,
}

/// AWSConfigParams - Settings shared by every AWS client
#[derive(Debug, Clone, Default)]
pub struct AWSConfigParams {
    pub prefix: Option<String>,
    pub endpoint_url: Option<Url>,
    pub region: Option<String>,
}

impl From<AWSConfigCliArgs> for AWSConfigParams {
    fn from(args: AWSConfigCliArgs) -> Self {
        Self {
            prefix: args.aws_prefix.filter(|prefix| !prefix.trim().is_empty()),
            endpoint_url: args.aws_endpoint_url,
            region: args.aws_region,
        }
    }
}

impl StorageArgs {
    fn from_cli(aws: &AWSConfigCliArgs, s3: &AWSS3CliArgs) -> Result<Self, OrchestratorError> {
        let bucket = s3.bucket_identifier.trim();
        if bucket.is_empty() {
            return Err(OrchestratorError::SetupCommandError("Bucket name not found".to_string()));
        }
        let bucket_name = match aws.aws_prefix.as_deref().filter(|prefix| !prefix.trim().is_empty()) {
            Some(prefix) => format!("{}-{}", prefix, bucket),
            None => bucket.to_string(),
        };
        Ok(Self { bucket_name })
    }
}

impl QueueArgs {
    fn from_cli(aws: &AWSConfigCliArgs, sqs: &AWSSQSCliArgs) -> Result<Self, OrchestratorError> {
        if !sqs.queue_identifier.contains("{}") {
            return Err(OrchestratorError::SetupCommandError(format!(
                "Queue identifier {} must contain a '{{}}' placeholder for the queue type",
                sqs.queue_identifier
            )));
        }
        let queue_template = match aws.aws_prefix.as_deref().filter(|prefix| !prefix.trim().is_empty()) {
            Some(prefix) => format!("{}_{}", prefix, sqs.queue_identifier),
            None => sqs.queue_identifier.clone(),
        };
        Ok(Self { queue_template })
    }
}

/// NOTE: The following implementations convert the command line arguments
/// to the respective argument structs and validate them along the way.
/// Since we have only one Cloud Provider (AWS) for now, we are not using the provider-based implementation.
impl TryFrom<RunCmd> for StorageArgs {
    type Error = OrchestratorError;
    fn try_from(run_cmd: RunCmd) -> Result<Self, Self::Error> {
        Self::from_cli(&run_cmd.aws_config_args, &run_cmd.aws_s3_args)
    }
}

impl TryFrom<SetupCmd> for StorageArgs {
    type Error = OrchestratorError;
    fn try_from(setup_cmd: SetupCmd) -> Result<Self, Self::Error> {
        Self::from_cli(&setup_cmd.aws_config_args, &setup_cmd.aws_s3_args)
    }
}

impl TryFrom<RunCmd> for QueueArgs {
    type Error = OrchestratorError;
    fn try_from(run_cmd: RunCmd) -> Result<Self, Self::Error> {
        Self::from_cli(&run_cmd.aws_config_args, &run_cmd.aws_sqs_args)
    }
}

impl TryFrom<SetupCmd> for QueueArgs {
    type Error = OrchestratorError;
    fn try_from(setup_cmd: SetupCmd) -> Result<Self, Self::Error> {
        Self::from_cli(&setup_cmd.aws_config_args, &setup_cmd.aws_sqs_args)
    }
}
