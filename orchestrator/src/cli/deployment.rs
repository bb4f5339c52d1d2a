use clap::Args;
use url::Url;

/// Parameters of the external deployment service and of the polling loop driving it.
#[derive(Debug, Clone, Args)]
pub struct DeploymentServiceCliArgs {
    /// Base URL of the deployment service.
    #[arg(env = "ZKFLOW_DEPLOYMENT_SERVICE_URL", long, default_value = "http://localhost:4000")]
    pub deployment_service_url: Url,

    /// Seconds between two status checks.
    #[arg(env = "ZKFLOW_DEPLOYMENT_POLL_INTERVAL_SECONDS", long, default_value = "10")]
    pub deployment_poll_interval_seconds: u64,

    /// Maximum number of status checks before the deployment times out.
    #[arg(env = "ZKFLOW_DEPLOYMENT_MAX_POLL_ATTEMPTS", long, default_value = "60")]
    pub deployment_max_poll_attempts: u32,

    /// Maximum number of contract-info lookups once the deployment job completed.
    #[arg(env = "ZKFLOW_DEPLOYMENT_CONTRACT_INFO_ATTEMPTS", long, default_value = "10")]
    pub deployment_contract_info_attempts: u32,

    /// Transient errors within this many final attempts fail the deployment.
    #[arg(env = "ZKFLOW_DEPLOYMENT_FATAL_WINDOW", long, default_value = "5")]
    pub deployment_fatal_window: u32,

    /// Timeout of the start request, in seconds.
    #[arg(env = "ZKFLOW_DEPLOYMENT_START_TIMEOUT_SECONDS", long, default_value = "30")]
    pub deployment_start_timeout_seconds: u64,

    /// Timeout of the status and contract-info requests, in seconds.
    #[arg(env = "ZKFLOW_DEPLOYMENT_QUERY_TIMEOUT_SECONDS", long, default_value = "10")]
    pub deployment_query_timeout_seconds: u64,
}
