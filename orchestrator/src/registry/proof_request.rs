use mongodb::bson::oid::ObjectId;
use tracing::{info, warn};

use super::{RegistryError, RegistryResult};
use crate::core::client::database::DatabaseClient;
use crate::types::proof_request::{ProofArtifacts, ProofRequest, ProofRequestStatus, ProofRequestUpdates};

const ENTITY: &str = "ProofRequest";

pub struct ProofRequestRegistry;

impl ProofRequestRegistry {
    pub async fn create_proof_request(
        db: &dyn DatabaseClient,
        circuit_id: ObjectId,
        user_id: Option<String>,
    ) -> RegistryResult<ProofRequest> {
        let proof_request = db.insert_proof_request(ProofRequest::new_pending(circuit_id, user_id)).await?;
        info!(proof_request_id = %proof_request.id, circuit_id = %circuit_id, "Created proof request");
        Ok(proof_request)
    }

    pub async fn get_proof_request(db: &dyn DatabaseClient, id: &str) -> RegistryResult<ProofRequest> {
        let object_id = super::parse_object_id(ENTITY, id)?;
        db.get_proof_request_by_id(object_id).await?.ok_or(RegistryError::NotFound { entity: ENTITY, id: id.to_string() })
    }

    /// `Ok(None)` when the request already reached a terminal status
    pub async fn mark_proof_completed(
        db: &dyn DatabaseClient,
        id: ObjectId,
        artifacts: ProofArtifacts,
    ) -> RegistryResult<Option<ProofRequest>> {
        Self::finish(db, id, ProofRequestUpdates::completed(artifacts)).await
    }

    pub async fn mark_proof_failed(
        db: &dyn DatabaseClient,
        id: ObjectId,
        message: impl Into<String>,
    ) -> RegistryResult<Option<ProofRequest>> {
        Self::finish(db, id, ProofRequestUpdates::failed(message)).await
    }

    async fn finish(
        db: &dyn DatabaseClient,
        id: ObjectId,
        update: ProofRequestUpdates,
    ) -> RegistryResult<Option<ProofRequest>> {
        match db.update_proof_request(id, vec![ProofRequestStatus::Pending], update).await? {
            Some(updated) => Ok(Some(updated)),
            None => {
                let current =
                    db.get_proof_request_by_id(id).await?.ok_or(RegistryError::NotFound { entity: ENTITY, id: id.to_hex() })?;
                warn!(proof_request_id = %id, status = %current.status, "Proof request already terminal, update skipped");
                Ok(None)
            }
        }
    }
}
