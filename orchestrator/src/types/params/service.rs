use crate::cli::server::ServerCliArgs;
use crate::cli::service::ServiceCliArgs;
use crate::types::queue::QueueType;
use crate::types::queue_control::QUEUES;

#[derive(Debug, Clone, Default)]
pub struct ServiceParams {
    /// Per-queue concurrency overrides, the queue defaults apply when unset
    pub keygen_concurrency: Option<usize>,
    pub proof_concurrency: Option<usize>,
    pub deployment_concurrency: Option<usize>,
    pub legacy_deploy_concurrency: Option<usize>,
    pub workers_enabled: bool,
}

impl ServiceParams {
    /// Number of jobs of `queue` a worker runs at the same time
    pub fn concurrency_for(&self, queue: QueueType) -> usize {
        let configured = match queue {
            QueueType::KeyGeneration => self.keygen_concurrency,
            QueueType::ProofGeneration => self.proof_concurrency,
            QueueType::Deployment => self.deployment_concurrency,
            QueueType::LegacyDeploy => self.legacy_deploy_concurrency,
            QueueType::Cleanup => None,
        };
        configured.or_else(|| QUEUES.get(&queue).map(|config| config.queue_control.max_message_count)).unwrap_or(1)
    }
}

impl From<ServiceCliArgs> for ServiceParams {
    fn from(args: ServiceCliArgs) -> Self {
        Self {
            keygen_concurrency: args.keygen_concurrency,
            proof_concurrency: args.proof_concurrency,
            deployment_concurrency: args.deployment_concurrency,
            legacy_deploy_concurrency: args.legacy_deploy_concurrency,
            workers_enabled: args.workers_enabled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerParams {
    pub host: String,
    pub port: u16,
}

impl From<ServerCliArgs> for ServerParams {
    fn from(value: ServerCliArgs) -> Self {
        Self { host: value.host, port: value.port }
    }
}
