use std::time::Duration;

use url::Url;
use zkflow_deployment_service::DeploymentServiceTimeouts;

use crate::cli::deployment::DeploymentServiceCliArgs;

#[derive(Debug, Clone)]
pub struct DeploymentServiceParams {
    pub base_url: Url,
    pub timeouts: DeploymentServiceTimeouts,
}

/// Budget of the deployment polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeploymentPollParams {
    pub interval: Duration,
    pub max_attempts: u32,
    pub contract_info_attempts: u32,
    /// Errors within this many final attempts are fatal instead of retried
    pub fatal_window: u32,
}

impl Default for DeploymentPollParams {
    fn default() -> Self {
        Self { interval: Duration::from_secs(10), max_attempts: 60, contract_info_attempts: 10, fatal_window: 5 }
    }
}

impl From<&DeploymentServiceCliArgs> for DeploymentServiceParams {
    fn from(args: &DeploymentServiceCliArgs) -> Self {
        Self {
            base_url: args.deployment_service_url.clone(),
            timeouts: DeploymentServiceTimeouts {
                start: Duration::from_secs(args.deployment_start_timeout_seconds),
                query: Duration::from_secs(args.deployment_query_timeout_seconds),
            },
        }
    }
}

impl From<&DeploymentServiceCliArgs> for DeploymentPollParams {
    fn from(args: &DeploymentServiceCliArgs) -> Self {
        Self {
            interval: Duration::from_secs(args.deployment_poll_interval_seconds),
            max_attempts: args.deployment_max_poll_attempts.max(1),
            contract_info_attempts: args.deployment_contract_info_attempts.max(1),
            fatal_window: args.deployment_fatal_window,
        }
    }
}
