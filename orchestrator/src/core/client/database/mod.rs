pub mod constant;
pub mod error;
pub mod mongodb;

use crate::types::circuit::{Circuit, CircuitStatus, CircuitUpdates};
use crate::types::proof_request::{ProofRequest, ProofRequestStatus, ProofRequestUpdates};
use ::mongodb::bson::oid::ObjectId;
use async_trait::async_trait;
pub use error::DatabaseError;

/// Trait defining database operations
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// insert_circuit - Insert a new circuit, failing with `ItemAlreadyExists` on a duplicate hash
    async fn insert_circuit(&self, circuit: Circuit) -> Result<Circuit, DatabaseError>;
    async fn get_circuit_by_id(&self, id: ObjectId) -> Result<Option<Circuit>, DatabaseError>;
    async fn get_circuit_by_hash(&self, circuit_hash: &str) -> Result<Option<Circuit>, DatabaseError>;
    /// update_circuit - Apply a partial update if the circuit is currently in one of `allowed_statuses`.
    /// Returns the updated document, or `None` when nothing matched.
    async fn update_circuit(
        &self,
        id: ObjectId,
        allowed_statuses: Vec<CircuitStatus>,
        update: CircuitUpdates,
    ) -> Result<Option<Circuit>, DatabaseError>;
    async fn get_circuits_by_status(&self, status: CircuitStatus) -> Result<Vec<Circuit>, DatabaseError>;
    /// migrate_legacy_circuit_status - Rewrite the deprecated `ready` status, returns the number of rows changed
    async fn migrate_legacy_circuit_status(&self) -> Result<u64, DatabaseError>;

    async fn insert_proof_request(&self, proof_request: ProofRequest) -> Result<ProofRequest, DatabaseError>;
    async fn get_proof_request_by_id(&self, id: ObjectId) -> Result<Option<ProofRequest>, DatabaseError>;
    async fn update_proof_request(
        &self,
        id: ObjectId,
        allowed_statuses: Vec<ProofRequestStatus>,
        update: ProofRequestUpdates,
    ) -> Result<Option<ProofRequest>, DatabaseError>;

    /// create_indexes - Create the indexes both collections rely on (idempotent)
    async fn create_indexes(&self) -> Result<(), DatabaseError>;

    /// Perform a health check on the database
    async fn health_check(&self) -> Result<(), DatabaseError>;
}
