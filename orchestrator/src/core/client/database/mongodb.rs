use super::error::DatabaseError;
use crate::core::client::database::constant::{
    CIRCUITS_COLLECTION, DUPLICATE_KEY_ERROR_CODE, PROOF_REQUESTS_COLLECTION,
};
use crate::core::client::database::DatabaseClient;
use crate::types::circuit::{Circuit, CircuitStatus, CircuitUpdates, LEGACY_READY_STATUS};
use crate::types::params::database::DatabaseArgs;
use crate::types::proof_request::{ProofRequest, ProofRequestStatus, ProofRequestUpdates};
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use futures::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument};
use mongodb::{bson, Client, Collection, Database, IndexModel};
use opentelemetry::KeyValue;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

pub trait ToDocument {
    fn to_document(&self) -> Result<Document, DatabaseError>;
}

impl<T: Serialize> ToDocument for T {
    fn to_document(&self) -> Result<Document, DatabaseError> {
        let doc = bson::to_bson(self)?;

        if let Bson::Document(doc) = doc {
            Ok(doc)
        } else {
            Err(DatabaseError::FailedToSerializeDocument(format!("Failed to serialize document: {}", doc)))
        }
    }
}

/// Build the `$set` document of a partial update, skipping unset fields and stamping `updated_at`.
fn set_document<T: Serialize>(update: &T) -> Result<Document, DatabaseError> {
    let updates = update.to_document()?;

    // remove null values from the updates
    let mut non_null_updates = Document::new();
    for (k, v) in updates {
        if v != Bson::Null {
            non_null_updates.insert(k, v);
        }
    }

    // throw an error if there's no field to be updated
    if non_null_updates.is_empty() {
        return Err(DatabaseError::NoUpdateFound("No field to be updated, likely a false call".to_string()));
    }

    non_null_updates.insert("updated_at", Bson::DateTime(Utc::now().round_subsecs(0).into()));
    Ok(doc! { "$set": non_null_updates })
}

/// Status filter for circuits. Rows still carrying the legacy `ready` value count as `ready_for_deployment`.
fn circuit_status_filter(statuses: &[CircuitStatus]) -> Result<Bson, DatabaseError> {
    let mut values = Vec::with_capacity(statuses.len() + 1);
    for status in statuses {
        values.push(bson::to_bson(status)?);
        if *status == CircuitStatus::ReadyForDeployment {
            values.push(Bson::String(LEGACY_READY_STATUS.to_string()));
        }
    }
    Ok(Bson::Document(doc! { "$in": values }))
}

fn is_duplicate_key_error(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => write_error.code == DUPLICATE_KEY_ERROR_CODE,
        _ => false,
    }
}

fn record_db_call(operation: &'static str, start: Instant) {
    let attributes = [KeyValue::new("db_operation_name", operation)];
    ORCHESTRATOR_METRICS.db_calls_response_time.record(start.elapsed().as_secs_f64(), &attributes);
}

/// MongoDB client implementation
pub struct MongoDbClient {
    client: Client,
    database: Arc<Database>,
}

impl MongoDbClient {
    pub async fn new(config: &DatabaseArgs) -> Result<Self, DatabaseError> {
        let client = Client::with_uri_str(&config.connection_uri)
            .await
            .map_err(|e| DatabaseError::InvalidUri(format!("{}: {}", config.connection_uri, e)))?;
        let database = Arc::new(client.database(&config.database_name));
        Ok(Self { client, database })
    }

    /// Mongodb client uses Arc internally, reducing the cost of clone.
    pub fn client(&self) -> Client {
        self.client.clone()
    }

    fn circuits(&self) -> Collection<Circuit> {
        self.database.collection(CIRCUITS_COLLECTION)
    }

    fn proof_requests(&self) -> Collection<ProofRequest> {
        self.database.collection(PROOF_REQUESTS_COLLECTION)
    }
}

#[async_trait]
impl DatabaseClient for MongoDbClient {
    async fn insert_circuit(&self, circuit: Circuit) -> Result<Circuit, DatabaseError> {
        let start = Instant::now();
        match self.circuits().insert_one(&circuit, None).await {
            Ok(_) => {
                debug!(circuit_id = %circuit.id, "Circuit inserted in MongoDB");
                record_db_call("insert_circuit", start);
                Ok(circuit)
            }
            Err(e) if is_duplicate_key_error(&e) => Err(DatabaseError::ItemAlreadyExists(format!(
                "Circuit already exists for hash {}",
                circuit.circuit_hash
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn get_circuit_by_id(&self, id: ObjectId) -> Result<Option<Circuit>, DatabaseError> {
        let start = Instant::now();
        let circuit = self.circuits().find_one(doc! { "_id": id }, None).await?;
        record_db_call("get_circuit_by_id", start);
        Ok(circuit)
    }

    async fn get_circuit_by_hash(&self, circuit_hash: &str) -> Result<Option<Circuit>, DatabaseError> {
        let start = Instant::now();
        let circuit = self.circuits().find_one(doc! { "circuit_hash": circuit_hash }, None).await?;
        record_db_call("get_circuit_by_hash", start);
        Ok(circuit)
    }

    /// update_circuit - Conditional partial update.
    /// The filter pins both the id and the set of statuses the circuit may currently be in,
    /// so a concurrent writer that already moved the circuit makes this call a no-op.
    async fn update_circuit(
        &self,
        id: ObjectId,
        allowed_statuses: Vec<CircuitStatus>,
        update: CircuitUpdates,
    ) -> Result<Option<Circuit>, DatabaseError> {
        let start = Instant::now();
        let filter = doc! {
            "_id": id,
            "status": circuit_status_filter(&allowed_statuses)?,
        };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();

        let update = set_document(&update)?;
        let result = self.circuits().find_one_and_update(filter, update, options).await?;
        record_db_call("update_circuit", start);
        if result.is_none() {
            warn!(circuit_id = %id, allowed = ?allowed_statuses, "Circuit not updated, it is missing or not in an allowed status");
        }
        Ok(result)
    }

    async fn get_circuits_by_status(&self, status: CircuitStatus) -> Result<Vec<Circuit>, DatabaseError> {
        let start = Instant::now();
        let filter = doc! { "status": circuit_status_filter(&[status])? };
        let options = FindOptions::builder().sort(doc! { "created_at": -1 }).build();
        let circuits: Vec<Circuit> = self.circuits().find(filter, options).await?.try_collect().await?;
        debug!(count = circuits.len(), status = %status, "Fetched circuits by status");
        record_db_call("get_circuits_by_status", start);
        Ok(circuits)
    }

    async fn migrate_legacy_circuit_status(&self) -> Result<u64, DatabaseError> {
        let start = Instant::now();
        let filter = doc! { "status": LEGACY_READY_STATUS };
        let update = set_document(&CircuitUpdates::status(CircuitStatus::ReadyForDeployment))?;
        let result = self.circuits().update_many(filter, update, None).await?;
        record_db_call("migrate_legacy_circuit_status", start);
        Ok(result.modified_count)
    }

    async fn insert_proof_request(&self, proof_request: ProofRequest) -> Result<ProofRequest, DatabaseError> {
        let start = Instant::now();
        self.proof_requests().insert_one(&proof_request, None).await?;
        debug!(proof_request_id = %proof_request.id, "Proof request inserted in MongoDB");
        record_db_call("insert_proof_request", start);
        Ok(proof_request)
    }

    async fn get_proof_request_by_id(&self, id: ObjectId) -> Result<Option<ProofRequest>, DatabaseError> {
        let start = Instant::now();
        let proof_request = self.proof_requests().find_one(doc! { "_id": id }, None).await?;
        record_db_call("get_proof_request_by_id", start);
        Ok(proof_request)
    }

    async fn update_proof_request(
        &self,
        id: ObjectId,
        allowed_statuses: Vec<ProofRequestStatus>,
        update: ProofRequestUpdates,
    ) -> Result<Option<ProofRequest>, DatabaseError> {
        let start = Instant::now();
        let statuses = allowed_statuses.iter().map(bson::to_bson).collect::<Result<Vec<Bson>, _>>()?;
        let filter = doc! {
            "_id": id,
            "status": { "$in": statuses },
        };
        let options = FindOneAndUpdateOptions::builder().upsert(false).return_document(ReturnDocument::After).build();

        let update = set_document(&update)?;
        let result = self.proof_requests().find_one_and_update(filter, update, options).await?;
        record_db_call("update_proof_request", start);
        Ok(result)
    }

    async fn create_indexes(&self) -> Result<(), DatabaseError> {
        let unique = IndexOptions::builder().unique(true).build();
        self.circuits()
            .create_indexes(
                vec![
                    IndexModel::builder().keys(doc! { "circuit_hash": 1 }).options(unique).build(),
                    IndexModel::builder().keys(doc! { "status": 1 }).build(),
                    IndexModel::builder().keys(doc! { "template": 1 }).build(),
                ],
                None,
            )
            .await?;
        self.proof_requests()
            .create_indexes(
                vec![
                    IndexModel::builder().keys(doc! { "circuit_id": 1 }).build(),
                    IndexModel::builder().keys(doc! { "status": 1 }).build(),
                    IndexModel::builder().keys(doc! { "user_id": 1 }).build(),
                ],
                None,
            )
            .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        self.database.run_command(doc! { "ping": 1 }, None).await?;
        Ok(())
    }
}
