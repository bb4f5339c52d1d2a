use chrono::Utc;
use mongodb::bson::oid::ObjectId;
use serde::Serialize;
use tracing::{debug, info};

use super::{RegistryError, RegistryResult};
use crate::core::client::database::{DatabaseClient, DatabaseError};
use crate::types::circuit::{Circuit, CircuitParams, CircuitStatus, CircuitUpdates};
use crate::utils::hashing::content_hash;
use crate::utils::scratch::random_hex_id;

const ENTITY: &str = "Circuit";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CircuitIdentity<'a> {
    params: &'a CircuitParams,
    template_name: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UniqueCircuitIdentity<'a> {
    params: &'a CircuitParams,
    random: &'a str,
    template_name: &'a str,
    timestamp: i64,
}

fn hashing_error(e: serde_json::Error) -> RegistryError {
    RegistryError::StoreUnavailable(DatabaseError::FailedToSerializeDocument(e.to_string()))
}

/// Hash shared by every circuit built from the same template and params
pub fn circuit_content_hash(template: &str, params: &CircuitParams) -> Result<String, serde_json::Error> {
    content_hash(&CircuitIdentity { params, template_name: template })
}

pub struct CircuitRegistry;

impl CircuitRegistry {
    /// Always inserts a new circuit, even when an identical template and params already exist.
    pub async fn create_new_circuit(
        db: &dyn DatabaseClient,
        template: &str,
        params: CircuitParams,
    ) -> RegistryResult<Circuit> {
        let random = random_hex_id();
        let circuit_hash = content_hash(&UniqueCircuitIdentity {
            params: &params,
            random: &random,
            template_name: template,
            timestamp: Utc::now().timestamp_millis(),
        })
        .map_err(hashing_error)?;

        let circuit = db.insert_circuit(Circuit::new_pending(circuit_hash, template.to_string(), params)).await?;
        info!(circuit_id = %circuit.id, template = %template, "Created circuit");
        Ok(circuit)
    }

    /// Returns the circuit already stored for this template and params, creating it if there is none.
    pub async fn find_or_create_circuit(
        db: &dyn DatabaseClient,
        template: &str,
        params: CircuitParams,
    ) -> RegistryResult<Circuit> {
        let circuit_hash = circuit_content_hash(template, &params).map_err(hashing_error)?;
        if let Some(existing) = db.get_circuit_by_hash(&circuit_hash).await? {
            debug!(circuit_id = %existing.id, "Reusing existing circuit");
            return Ok(existing);
        }

        match db.insert_circuit(Circuit::new_pending(circuit_hash.clone(), template.to_string(), params)).await {
            Ok(circuit) => {
                info!(circuit_id = %circuit.id, template = %template, "Created circuit");
                Ok(circuit)
            }
            // lost the race against a concurrent insert of the same content
            Err(DatabaseError::ItemAlreadyExists(message)) => db
                .get_circuit_by_hash(&circuit_hash)
                .await?
                .ok_or(RegistryError::StoreUnavailable(DatabaseError::ItemAlreadyExists(message))),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn get_circuit(db: &dyn DatabaseClient, id: &str) -> RegistryResult<Circuit> {
        let object_id = super::parse_object_id(ENTITY, id)?;
        Self::get_circuit_by_object_id(db, object_id).await
    }

    pub async fn get_circuit_by_object_id(db: &dyn DatabaseClient, id: ObjectId) -> RegistryResult<Circuit> {
        db.get_circuit_by_id(id).await?.ok_or(RegistryError::NotFound { entity: ENTITY, id: id.to_hex() })
    }

    /// Apply `update` if the circuit is currently in one of `from`.
    ///
    /// `Ok(None)` means the circuit exists but was in another status, so nothing was written.
    pub async fn transition_circuit(
        db: &dyn DatabaseClient,
        id: ObjectId,
        from: &[CircuitStatus],
        update: CircuitUpdates,
    ) -> RegistryResult<Option<Circuit>> {
        match db.update_circuit(id, from.to_vec(), update).await? {
            Some(circuit) => Ok(Some(circuit)),
            None => {
                // distinguish a missing row from a status mismatch
                Self::get_circuit_by_object_id(db, id).await?;
                Ok(None)
            }
        }
    }

    /// Partial merge of `update`, last writer wins. Terminal circuits are never touched.
    pub async fn update_circuit_fields(
        db: &dyn DatabaseClient,
        id: ObjectId,
        update: CircuitUpdates,
    ) -> RegistryResult<Option<Circuit>> {
        Self::transition_circuit(db, id, &CircuitStatus::NON_TERMINAL, update).await
    }

    pub async fn list_circuits_by_status(
        db: &dyn DatabaseClient,
        status: CircuitStatus,
    ) -> RegistryResult<Vec<Circuit>> {
        Ok(db.get_circuits_by_status(status).await?)
    }
}
