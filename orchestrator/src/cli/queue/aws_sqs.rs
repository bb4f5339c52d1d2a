use clap::Args;

/// Parameters used to config AWS SQS.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct AWSSQSCliArgs {
    /// The name template of the queues.
    /// {} will be replaced by Queue Type.
    /// i.e for the deployment queue : zkflow_deployment_queue
    #[arg(env = "ZKFLOW_AWS_SQS_QUEUE_IDENTIFIER", long, default_value = "zkflow_{}_queue")]
    pub queue_identifier: String,
}
