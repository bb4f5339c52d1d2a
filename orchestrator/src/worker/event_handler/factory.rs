use crate::types::queue::QueueType;
use crate::worker::event_handler::jobs::{
    cleanup::CleanupJobHandler, deployment::DeploymentJobHandler, key_generation::KeyGenerationJobHandler,
    legacy_deploy::LegacyDeployJobHandler, proof_generation::ProofGenerationJobHandler, JobHandlerTrait,
};

/// To get the job handler of a queue
pub fn get_job_handler(queue: QueueType) -> Box<dyn JobHandlerTrait> {
    match queue {
        QueueType::KeyGeneration => Box::new(KeyGenerationJobHandler),
        QueueType::ProofGeneration => Box::new(ProofGenerationJobHandler),
        QueueType::Cleanup => Box::new(CleanupJobHandler),
        QueueType::LegacyDeploy => Box::new(LegacyDeployJobHandler),
        QueueType::Deployment => Box::new(DeploymentJobHandler),
    }
}
