use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDeploymentRequest {
    pub circuit_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartDeploymentData {
    pub job_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartDeploymentResponse {
    #[serde(default)]
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<StartDeploymentData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentStatusData {
    pub status: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeploymentStatusResponse {
    pub success: Option<bool>,
    pub data: Option<DeploymentStatusData>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractInfoData {
    pub status: Option<String>,
    pub contract_address: Option<String>,
    pub tx_hash: Option<String>,
    pub deployed_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ContractInfoResponse {
    pub data: Option<ContractInfoData>,
}

/// Job state reported by the deployment service.
///
/// Values outside the known vocabulary are kept verbatim in [`DeploymentState::Unknown`]
/// so callers can log them instead of guessing a terminal state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeploymentState {
    Pending,
    Processing,
    Completed,
    Deployed,
    Failed,
    Error,
    Unknown(String),
}

impl DeploymentState {
    /// `completed` and `deployed` both mean the transaction went through;
    /// the contract registry may still lag behind.
    pub fn is_success(&self) -> bool {
        matches!(self, DeploymentState::Completed | DeploymentState::Deployed)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DeploymentState::Failed | DeploymentState::Error)
    }
}

impl From<&str> for DeploymentState {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" | "queued" | "waiting" => DeploymentState::Pending,
            "processing" | "in_progress" | "running" | "deploying" | "active" => DeploymentState::Processing,
            "completed" => DeploymentState::Completed,
            "deployed" => DeploymentState::Deployed,
            "failed" => DeploymentState::Failed,
            "error" => DeploymentState::Error,
            _ => DeploymentState::Unknown(value.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentJobStatus {
    pub state: DeploymentState,
    /// Provider error text, taken from `data.error` first and the top level `error` second
    pub error: Option<String>,
}

impl From<DeploymentStatusResponse> for DeploymentJobStatus {
    fn from(response: DeploymentStatusResponse) -> Self {
        let (status, data_error) = match response.data {
            Some(data) => (data.status, data.error),
            None => (None, None),
        };
        let state = match status {
            Some(status) => DeploymentState::from(status.as_str()),
            None => DeploymentState::Unknown(String::new()),
        };
        Self { state, error: data_error.or(response.error) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractInfo {
    pub state: DeploymentState,
    pub contract_address: Option<String>,
    pub tx_hash: Option<String>,
    pub deployed_at: Option<String>,
}

impl ContractInfo {
    /// The contract is usable once the registry reports it deployed with a non-empty address.
    pub fn deployed_address(&self) -> Option<&str> {
        match (&self.state, self.contract_address.as_deref()) {
            (DeploymentState::Deployed, Some(address)) if !address.trim().is_empty() => Some(address),
            _ => None,
        }
    }
}

impl From<ContractInfoResponse> for ContractInfo {
    fn from(response: ContractInfoResponse) -> Self {
        match response.data {
            Some(data) => Self {
                state: data
                    .status
                    .as_deref()
                    .map(DeploymentState::from)
                    .unwrap_or_else(|| DeploymentState::Unknown(String::new())),
                contract_address: data.contract_address,
                tx_hash: data.tx_hash,
                deployed_at: data.deployed_at,
            },
            None => Self {
                state: DeploymentState::Unknown(String::new()),
                contract_address: None,
                tx_hash: None,
                deployed_at: None,
            },
        }
    }
}
