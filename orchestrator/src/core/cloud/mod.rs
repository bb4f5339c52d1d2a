use aws_config::{BehaviorVersion, Region, SdkConfig};

use crate::types::params::AWSConfigParams;

/// Cloud provider
/// This enum represents the different cloud providers that the Orchestrator can interact with.
#[derive(Clone)]
pub enum CloudProvider {
    AWS(Box<SdkConfig>),
}

impl CloudProvider {
    /// Load the AWS configuration from the default provider chain, applying the
    /// endpoint and region overrides when present.
    pub async fn from_params(params: &AWSConfigParams) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint_url) = &params.endpoint_url {
            loader = loader.endpoint_url(endpoint_url.as_str().trim_end_matches('/'));
        }
        if let Some(region) = &params.region {
            loader = loader.region(Region::new(region.clone()));
        }
        CloudProvider::AWS(Box::new(loader.load().await))
    }

    /// Returns the AWS SDK config
    pub fn get_aws_config(&self) -> &SdkConfig {
        match self {
            CloudProvider::AWS(config) => config.as_ref(),
        }
    }

    pub fn get_provider_name(&self) -> String {
        match self {
            CloudProvider::AWS(_) => "AWS".to_string(),
        }
    }
}

impl std::fmt::Debug for CloudProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.get_provider_name().as_str())
    }
}
