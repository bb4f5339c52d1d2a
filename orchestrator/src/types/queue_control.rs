use lazy_static::lazy_static;
use std::collections::HashMap;
use std::time::Duration;

use crate::types::queue::QueueType;

/// Delay applied before a failed job is attempted again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    None,
    Fixed(Duration),
    /// `base * 2^(attempt - 1)` where `attempt` is the attempt that just failed
    Exponential(Duration),
}

impl Backoff {
    pub fn delay_after(&self, failed_attempt: u32) -> Duration {
        match self {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed(delay) => *delay,
            Backoff::Exponential(base) => {
                let exponent = failed_attempt.saturating_sub(1).min(16);
                base.saturating_mul(1u32 << exponent)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobPolicy {
    /// Total number of attempts, the first one included
    pub attempts: u32,
    pub backoff: Backoff,
}

#[derive(Debug, Clone)]
pub struct QueueControlConfig {
    // Max message count is the number of jobs a worker runs concurrently.
    pub max_message_count: usize,
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub visibility_timeout: u32,
    pub policy: JobPolicy,
    pub queue_control: QueueControlConfig,
}

lazy_static! {
    pub static ref QUEUES: HashMap<QueueType, QueueConfig> = {
        let mut map = HashMap::new();
        map.insert(
            QueueType::KeyGeneration,
            QueueConfig {
                visibility_timeout: 1800,
                policy: JobPolicy { attempts: 3, backoff: Backoff::Exponential(Duration::from_secs(5)) },
                queue_control: QueueControlConfig { max_message_count: 1 },
            },
        );
        map.insert(
            QueueType::ProofGeneration,
            QueueConfig {
                visibility_timeout: 600,
                policy: JobPolicy { attempts: 2, backoff: Backoff::Fixed(Duration::from_secs(3)) },
                queue_control: QueueControlConfig { max_message_count: 1 },
            },
        );
        map.insert(
            QueueType::Cleanup,
            QueueConfig {
                visibility_timeout: 60,
                policy: JobPolicy { attempts: 1, backoff: Backoff::None },
                queue_control: QueueControlConfig { max_message_count: 1 },
            },
        );
        map.insert(
            QueueType::LegacyDeploy,
            QueueConfig {
                visibility_timeout: 600,
                policy: JobPolicy { attempts: 2, backoff: Backoff::Fixed(Duration::from_secs(5)) },
                queue_control: QueueControlConfig { max_message_count: 1 },
            },
        );
        map.insert(
            QueueType::Deployment,
            QueueConfig {
                visibility_timeout: 1800,
                policy: JobPolicy { attempts: 2, backoff: Backoff::Exponential(Duration::from_secs(10)) },
                queue_control: QueueControlConfig { max_message_count: 2 },
            },
        );
        map
    };
}
