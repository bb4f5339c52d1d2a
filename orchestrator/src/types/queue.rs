use strum_macros::{Display, EnumIter};

#[derive(Display, Debug, Clone, Copy, PartialEq, Eq, EnumIter, Hash)]
pub enum QueueType {
    #[strum(serialize = "key_generation")]
    KeyGeneration,
    #[strum(serialize = "proof_generation")]
    ProofGeneration,
    #[strum(serialize = "cleanup")]
    Cleanup,
    #[strum(serialize = "legacy_deploy")]
    LegacyDeploy,
    #[strum(serialize = "deployment")]
    Deployment,
}

impl QueueType {
    /// Prefix of the job keys carried by messages on this queue
    pub fn job_key_prefix(&self) -> &'static str {
        match self {
            QueueType::KeyGeneration => "keygen",
            QueueType::ProofGeneration => "proof",
            QueueType::Cleanup => "cleanup",
            QueueType::LegacyDeploy => "deploy",
            QueueType::Deployment => "deployment",
        }
    }

    pub fn job_key(&self, subject: impl std::fmt::Display) -> String {
        format!("{}:{}", self.job_key_prefix(), subject)
    }
}
