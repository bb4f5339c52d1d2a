//! Lifecycle operations on the persisted entities.
//!
//! Everything here goes through [`DatabaseClient`](crate::core::client::database::DatabaseClient) and
//! propagates store failures to the caller untouched.

pub mod circuit;
pub mod proof_request;

use mongodb::bson::oid::ObjectId;
use thiserror::Error;

use crate::core::client::database::DatabaseError;

pub use circuit::CircuitRegistry;
pub use proof_request::ProofRequestRegistry;

pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// The id is malformed or no row carries it
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("Persistent store unavailable: {0}")]
    StoreUnavailable(#[from] DatabaseError),
}

/// Parse a 24-hex object id. An unparsable id is reported the same way as a missing row.
pub fn parse_object_id(entity: &'static str, id: &str) -> RegistryResult<ObjectId> {
    ObjectId::parse_str(id).map_err(|_| RegistryError::NotFound { entity, id: id.to_string() })
}
