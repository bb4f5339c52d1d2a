use clap::Args;
use url::Url;

/// Parameters used to config AWS.
#[derive(Debug, Clone, Args)]
pub struct AWSConfigCliArgs {
    /// The prefix value.
    /// And added to the start of each resource name if available
    #[arg(env = "ZKFLOW_AWS_PREFIX", long, default_value = None)]
    pub aws_prefix: Option<String>,

    /// Custom endpoint for every AWS client (e.g. localstack).
    #[arg(env = "ZKFLOW_AWS_ENDPOINT_URL", long)]
    pub aws_endpoint_url: Option<Url>,

    /// AWS region, falls back to the default provider chain when absent.
    #[arg(env = "AWS_REGION", long)]
    pub aws_region: Option<String>,
}
