use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::DeploymentServiceError;
use crate::types::{
    ContractInfo, ContractInfoResponse, DeploymentJobStatus, DeploymentStatusResponse, StartDeploymentRequest,
    StartDeploymentResponse,
};

const DEFAULT_START_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(10);

/// Per-request timeouts used when talking to the deployment service
#[derive(Debug, Clone, Copy)]
pub struct DeploymentServiceTimeouts {
    /// Timeout for `POST /api/deploy`
    pub start: Duration,
    /// Timeout for the status and contract-info queries
    pub query: Duration,
}

impl Default for DeploymentServiceTimeouts {
    fn default() -> Self {
        Self { start: DEFAULT_START_TIMEOUT, query: DEFAULT_QUERY_TIMEOUT }
    }
}

/// HTTP client for the external contract deployment service
pub struct DeploymentServiceClient {
    client: Client,
    base_url: Url,
    timeouts: DeploymentServiceTimeouts,
}

impl DeploymentServiceClient {
    pub fn new(base_url: Url, timeouts: DeploymentServiceTimeouts) -> Self {
        Self { client: Client::new(), base_url, timeouts }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, operation: &str, segments: &[&str]) -> Result<Url, DeploymentServiceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| DeploymentServiceError::UrlError {
                operation: operation.to_string(),
                message: format!("{} cannot be a base URL", self.base_url),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn decode<T: DeserializeOwned>(
        operation: &str,
        response: reqwest::Response,
    ) -> Result<T, DeploymentServiceError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DeploymentServiceError::ApiError { operation: operation.to_string(), status, message });
        }
        response.json::<T>().await.map_err(|e| DeploymentServiceError::from_reqwest_error(operation, e))
    }

    pub(crate) async fn start(&self, circuit_id: &str) -> Result<String, DeploymentServiceError> {
        const OPERATION: &str = "start_deployment";
        let url = self.endpoint(OPERATION, &["api", "deploy"])?;
        debug!(circuit_id = %circuit_id, url = %url, "Requesting contract deployment");

        let response = self
            .client
            .post(url)
            .timeout(self.timeouts.start)
            .json(&StartDeploymentRequest { circuit_id: circuit_id.to_string() })
            .send()
            .await
            .map_err(|e| DeploymentServiceError::from_reqwest_error(OPERATION, e))?;

        let body: StartDeploymentResponse = Self::decode(OPERATION, response).await?;
        if !body.success {
            return Err(DeploymentServiceError::Rejected {
                operation: OPERATION.to_string(),
                message: body.message.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        body.data.and_then(|data| data.job_id).filter(|id| !id.is_empty()).ok_or_else(|| {
            DeploymentServiceError::ParseError {
                operation: OPERATION.to_string(),
                message: "response is missing data.jobId".to_string(),
            }
        })
    }

    pub(crate) async fn status(&self, job_id: &str) -> Result<DeploymentJobStatus, DeploymentServiceError> {
        const OPERATION: &str = "get_deployment_status";
        let url = self.endpoint(OPERATION, &["api", "deploy", "status", job_id])?;

        let response = self
            .client
            .get(url)
            .timeout(self.timeouts.query)
            .send()
            .await
            .map_err(|e| DeploymentServiceError::from_reqwest_error(OPERATION, e))?;

        let body: DeploymentStatusResponse = Self::decode(OPERATION, response).await?;
        Ok(body.into())
    }

    pub(crate) async fn contract(&self, circuit_id: &str) -> Result<ContractInfo, DeploymentServiceError> {
        const OPERATION: &str = "get_contract_info";
        let url = self.endpoint(OPERATION, &["api", "deploy", "contract", circuit_id])?;

        let response = self
            .client
            .get(url)
            .timeout(self.timeouts.query)
            .send()
            .await
            .map_err(|e| DeploymentServiceError::from_reqwest_error(OPERATION, e))?;

        let body: ContractInfoResponse = Self::decode(OPERATION, response).await?;
        Ok(body.into())
    }

    pub(crate) async fn ping(&self) -> Result<(), DeploymentServiceError> {
        const OPERATION: &str = "health_check";
        let url = self.endpoint(OPERATION, &["health"])?;
        let response = self
            .client
            .get(url)
            .timeout(self.timeouts.query)
            .send()
            .await
            .map_err(|e| DeploymentServiceError::from_reqwest_error(OPERATION, e))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(DeploymentServiceError::ApiError {
                operation: OPERATION.to_string(),
                status: response.status(),
                message: "health endpoint returned a non-success status".to_string(),
            })
        }
    }
}
