use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Status value written by older releases before `ready_for_deployment` existed.
pub const LEGACY_READY_STATUS: &str = "ready";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CircuitStatus {
    Pending,
    #[serde(alias = "ready")]
    ReadyForDeployment,
    Deploying,
    Deployed,
    Failed,
}

impl CircuitStatus {
    pub const NON_TERMINAL: [CircuitStatus; 3] =
        [CircuitStatus::Pending, CircuitStatus::ReadyForDeployment, CircuitStatus::Deploying];

    pub fn is_terminal(&self) -> bool {
        match self {
            CircuitStatus::Deployed | CircuitStatus::Failed => true,
            CircuitStatus::Pending | CircuitStatus::ReadyForDeployment | CircuitStatus::Deploying => false,
        }
    }

    /// Keys exist from `ready_for_deployment` onwards, so proofs can be generated for these circuits.
    pub fn accepts_proofs(&self) -> bool {
        match self {
            CircuitStatus::ReadyForDeployment | CircuitStatus::Deploying | CircuitStatus::Deployed => true,
            CircuitStatus::Pending | CircuitStatus::Failed => false,
        }
    }
}

/// A template parameter value. Templates only ever see the string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Integer(value) => write!(f, "{}", value),
            ParamValue::Float(value) if value.is_finite() && value.fract() == 0.0 => write!(f, "{:.0}", value),
            ParamValue::Float(value) => write!(f, "{}", value),
            ParamValue::Text(value) => f.write_str(value),
        }
    }
}

pub type CircuitParams = BTreeMap<String, ParamValue>;

/// On-chain record written by the direct (locally signed) deployment path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyDeployment {
    pub address: String,
    pub chain_id: u64,
    pub tx_hash: String,
    pub block_number: u64,
    pub network: String,
}

/// Blob-store keys of the key-generation outputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitArtifacts {
    pub wasm: String,
    pub zkey: String,
    pub vkey: String,
    pub verifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<LegacyDeployment>,
}

impl CircuitArtifacts {
    pub const WASM_FILE: &'static str = "circuit.wasm";
    pub const ZKEY_FILE: &'static str = "circuit_final.zkey";
    pub const VKEY_FILE: &'static str = "verification_key.json";
    pub const VERIFIER_FILE: &'static str = "verifier.sol";

    pub fn storage_prefix(circuit_id: &ObjectId) -> String {
        format!("circuits/{}/", circuit_id.to_hex())
    }

    pub fn for_circuit(circuit_id: &ObjectId) -> Self {
        let prefix = Self::storage_prefix(circuit_id);
        Self {
            wasm: format!("{prefix}{}", Self::WASM_FILE),
            zkey: format!("{prefix}{}", Self::ZKEY_FILE),
            vkey: format!("{prefix}{}", Self::VKEY_FILE),
            verifier: format!("{prefix}{}", Self::VERIFIER_FILE),
            deployment: None,
        }
    }

    pub fn has_verifier(&self) -> bool {
        !self.verifier.trim().is_empty()
    }
}

/// Operational record of the orchestrated deployment path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<BsonDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub circuit_hash: String,
    pub template: String,
    pub params: CircuitParams,
    pub status: CircuitStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<CircuitArtifacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<DeploymentRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Circuit {
    /// A fresh `pending` circuit with a newly generated id.
    pub fn new_pending(circuit_hash: String, template: String, params: CircuitParams) -> Self {
        let now = Utc::now().round_subsecs(0);
        Self {
            id: ObjectId::new(),
            circuit_hash,
            template,
            params,
            status: CircuitStatus::Pending,
            artifacts: None,
            deployment: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn verifier_key(&self) -> Option<&str> {
        self.artifacts.as_ref().filter(|artifacts| artifacts.has_verifier()).map(|artifacts| artifacts.verifier.as_str())
    }
}

/// Partial update of a circuit. `None` fields are left untouched.
///
/// Nested fields are addressed with dotted paths so that an update never
/// replaces a whole sub-document it does not own.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CircuitUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CircuitStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<CircuitArtifacts>,
    #[serde(rename = "artifacts.deployment", skip_serializing_if = "Option::is_none")]
    pub legacy_deployment: Option<LegacyDeployment>,
    #[serde(rename = "deployment.jobId", skip_serializing_if = "Option::is_none")]
    pub deployment_job_id: Option<String>,
    #[serde(rename = "deployment.contractAddress", skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,
    #[serde(rename = "deployment.txHash", skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    #[serde(rename = "deployment.deployedAt", skip_serializing_if = "Option::is_none")]
    pub deployed_at: Option<BsonDateTime>,
    #[serde(rename = "deployment.error", skip_serializing_if = "Option::is_none")]
    pub deployment_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CircuitUpdates {
    pub fn status(status: CircuitStatus) -> Self {
        Self { status: Some(status), ..Default::default() }
    }

    pub fn ready(artifacts: CircuitArtifacts) -> Self {
        Self { status: Some(CircuitStatus::ReadyForDeployment), artifacts: Some(artifacts), ..Default::default() }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: Some(CircuitStatus::Failed), error: Some(error.into()), ..Default::default() }
    }

    pub fn deployment_failed(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            status: Some(CircuitStatus::Failed),
            deployment_error: Some(error.clone()),
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn deployed(contract_address: String, tx_hash: Option<String>, deployed_at: DateTime<Utc>) -> Self {
        Self {
            status: Some(CircuitStatus::Deployed),
            contract_address: Some(contract_address),
            tx_hash,
            deployed_at: Some(BsonDateTime::from_chrono(deployed_at)),
            ..Default::default()
        }
    }
}
