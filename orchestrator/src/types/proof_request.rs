use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ProofRequestStatus {
    Pending,
    Completed,
    Failed,
}

impl ProofRequestStatus {
    pub fn is_terminal(&self) -> bool {
        match self {
            ProofRequestStatus::Completed | ProofRequestStatus::Failed => true,
            ProofRequestStatus::Pending => false,
        }
    }
}

/// Output of the prover: the proof itself and the public signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofArtifacts {
    pub proof: Value,
    pub public: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofRequest {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub circuit_id: ObjectId,
    pub status: ProofRequestStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ProofArtifacts>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl ProofRequest {
    pub fn new_pending(circuit_id: ObjectId, user_id: Option<String>) -> Self {
        let now = Utc::now().round_subsecs(0);
        Self {
            id: ObjectId::new(),
            circuit_id,
            status: ProofRequestStatus::Pending,
            user_id,
            artifacts: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ProofRequestUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProofRequestStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ProofArtifacts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProofRequestUpdates {
    pub fn completed(artifacts: ProofArtifacts) -> Self {
        Self { status: Some(ProofRequestStatus::Completed), artifacts: Some(artifacts), error: None }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self { status: Some(ProofRequestStatus::Failed), artifacts: None, error: Some(error.into()) }
    }
}
