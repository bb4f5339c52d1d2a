use axum::response::Response;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::ApiServiceError;
use crate::types::circuit::{Circuit, CircuitArtifacts, CircuitParams, CircuitStatus, DeploymentRecord, ParamValue};
use crate::types::proof_request::{ProofArtifacts, ProofRequest, ProofRequestStatus};
use crate::types::templates::TemplateDescriptor;

/// Error body shared by every route.
///
/// ```
/// use zkflow_orchestrator::server::types::ApiResponse;
/// let response = ApiResponse::error("Circuit not found".to_string());
/// assert!(!response.success);
/// assert_eq!(response.message, "Circuit not found");
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub message: String,
}

impl ApiResponse {
    pub fn error(message: String) -> Self {
        Self { success: false, message }
    }
}

pub type ApiRouteResult = Result<Response<axum::body::Body>, ApiServiceError>;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCircuitRequest {
    pub template_name: Option<String>,
    pub params: Option<Map<String, Value>>,
}

impl CreateCircuitRequest {
    /// Trimmed template name and typed params, or the message of the first invalid field
    pub fn validate(self) -> Result<(String, CircuitParams), String> {
        let template_name = self.template_name.map(|name| name.trim().to_string()).unwrap_or_default();
        if template_name.is_empty() {
            return Err("\"templateName\" is required".to_string());
        }
        let raw_params = self.params.ok_or_else(|| "\"params\" is required".to_string())?;

        let mut params = CircuitParams::new();
        for (key, value) in raw_params {
            let param = match value {
                Value::Number(number) => match number.as_i64() {
                    Some(integer) => ParamValue::Integer(integer),
                    None => ParamValue::Float(number.as_f64().unwrap_or_default()),
                },
                Value::String(text) => ParamValue::Text(text),
                _ => return Err(format!("\"params.{}\" must be one of [number, string]", key)),
            };
            params.insert(key, param);
        }
        Ok((template_name, params))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDeployRequest {
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
    pub chain_id: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProofRequest {
    pub circuit_id: Option<String>,
    pub private_inputs: Option<Map<String, Value>>,
    pub public_inputs: Option<Map<String, Value>>,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentWebhookRequest {
    pub circuit_id: Option<String>,
    pub status: Option<String>,
    pub contract_address: Option<String>,
    pub tx_hash: Option<String>,
    pub deployed_at: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TemplatesQuery {
    pub show: Option<bool>,
}

/// Orchestrated deployment record with plain timestamps
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentView {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<DeploymentRecord> for DeploymentView {
    fn from(record: DeploymentRecord) -> Self {
        Self {
            job_id: record.job_id,
            contract_address: record.contract_address,
            tx_hash: record.tx_hash,
            deployed_at: record.deployed_at.map(|at| at.to_chrono()),
            error: record.error,
        }
    }
}

/// Circuit as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub circuit_hash: String,
    pub template: String,
    pub params: CircuitParams,
    pub status: CircuitStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<CircuitArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Circuit> for CircuitResponse {
    fn from(circuit: Circuit) -> Self {
        Self {
            id: circuit.id.to_hex(),
            circuit_hash: circuit.circuit_hash,
            template: circuit.template,
            params: circuit.params,
            status: circuit.status,
            artifacts: circuit.artifacts,
            deployment: circuit.deployment.map(DeploymentView::from),
            error: circuit.error,
            created_at: circuit.created_at,
            updated_at: circuit.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentQueuedResponse {
    pub message: &'static str,
    pub circuit_id: String,
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentStatusResponse {
    pub circuit_id: String,
    pub status: CircuitStatus,
    pub deployment: Option<DeploymentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRequestCreatedResponse {
    pub proof_request_id: String,
}

/// Body of `GET /v1/proofs/:id`. The fields present depend on the status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofStatusResponse {
    pub status: ProofRequestStatus,
    pub proof_request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ProofArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl From<ProofRequest> for ProofStatusResponse {
    fn from(request: ProofRequest) -> Self {
        let mut response = Self {
            status: request.status,
            proof_request_id: request.id.to_hex(),
            artifacts: None,
            error: None,
            created_at: request.created_at,
            completed_at: None,
            failed_at: None,
            message: None,
        };
        match request.status {
            ProofRequestStatus::Completed => {
                response.artifacts = request.artifacts;
                response.completed_at = Some(request.updated_at);
            }
            ProofRequestStatus::Failed => {
                response.error = request.error;
                response.failed_at = Some(request.updated_at);
            }
            ProofRequestStatus::Pending => response.message = Some("Proof generation is still in progress"),
        }
        response
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub message: &'static str,
    pub circuit_id: String,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TemplatesResponse {
    pub templates: Vec<TemplateDescriptor>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_s: u64,
}

#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failing: Vec<&'static str>,
}
