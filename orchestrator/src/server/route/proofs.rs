use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use tracing::{error, info, instrument, Span};

use crate::core::config::Config;
use crate::registry::{CircuitRegistry, ProofRequestRegistry, RegistryError};
use crate::server::error::ApiServiceError;
use crate::server::types::{ApiRouteResult, CreateProofRequest, ProofRequestCreatedResponse, ProofStatusResponse};
use crate::types::jobs::ProofGenerationPayload;
use crate::types::proof_request::ProofRequestStatus;
use crate::worker::service::JobService;

const CIRCUIT_NOT_READY: &str = "Circuit not ready for proof generation";

#[instrument(skip_all, fields(circuit_id = tracing::field::Empty, proof_request_id = tracing::field::Empty))]
async fn handle_create_proof(
    State(config): State<Arc<Config>>,
    body: Result<Json<CreateProofRequest>, JsonRejection>,
) -> ApiRouteResult {
    let Json(request) = body.map_err(|rejection| ApiServiceError::BadRequest(rejection.body_text()))?;
    let circuit_id = request
        .circuit_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiServiceError::BadRequest("\"circuitId\" is required".to_string()))?;
    let private_inputs =
        request.private_inputs.ok_or_else(|| ApiServiceError::BadRequest("\"privateInputs\" is required".to_string()))?;
    Span::current().record("circuit_id", circuit_id.as_str());

    let circuit = match CircuitRegistry::get_circuit(config.database(), &circuit_id).await {
        Ok(circuit) => circuit,
        Err(RegistryError::NotFound { .. }) => return Err(ApiServiceError::BadRequest(CIRCUIT_NOT_READY.to_string())),
        Err(e) => return Err(e.into()),
    };
    if !circuit.status.accepts_proofs() {
        return Err(ApiServiceError::BadRequest(CIRCUIT_NOT_READY.to_string()));
    }

    let proof_request = ProofRequestRegistry::create_proof_request(config.database(), circuit.id, request.user_id).await?;
    let proof_request_id = proof_request.id.to_hex();
    Span::current().record("proof_request_id", proof_request_id.as_str());

    let payload = ProofGenerationPayload {
        proof_request_id: proof_request_id.clone(),
        circuit_id: circuit.id.to_hex(),
        private_inputs,
        public_inputs: request.public_inputs.unwrap_or_default(),
    };
    if let Err(e) = JobService::enqueue_proof_generation(&config, payload).await {
        error!(error = %e, "Failed to enqueue proof generation");
        let message = format!("Failed to enqueue proof generation: {}", e);
        ProofRequestRegistry::mark_proof_failed(config.database(), proof_request.id, message).await?;
        return Err(e.into());
    }
    info!("Proof generation enqueued");

    Ok((StatusCode::ACCEPTED, Json(ProofRequestCreatedResponse { proof_request_id })).into_response())
}

/// Reports a proof request. The status code follows the request status: 200 completed,
/// 202 still pending, 400 failed.
#[instrument(skip(config), fields(proof_request_id = %id))]
async fn handle_get_proof(Path(id): Path<String>, State(config): State<Arc<Config>>) -> ApiRouteResult {
    let object_id = ObjectId::parse_str(&id)
        .map_err(|_| ApiServiceError::BadRequest("Invalid proofRequestId format".to_string()))?;
    let proof_request = config
        .database()
        .get_proof_request_by_id(object_id)
        .await?
        .ok_or_else(|| ApiServiceError::NotFound("Proof request not found".to_string()))?;

    let status = match proof_request.status {
        ProofRequestStatus::Completed => StatusCode::OK,
        ProofRequestStatus::Pending => StatusCode::ACCEPTED,
        ProofRequestStatus::Failed => StatusCode::BAD_REQUEST,
    };
    Ok((status, Json(ProofStatusResponse::from(proof_request))).into_response())
}

pub fn proof_router(config: Arc<Config>) -> Router {
    Router::new().route("/", post(handle_create_proof)).route("/:id", get(handle_get_proof)).with_state(config)
}
