use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use opentelemetry::KeyValue;
use tracing::{error, info, instrument};
use url::Url;

use crate::core::config::Config;
use crate::registry::{CircuitRegistry, RegistryError};
use crate::server::error::ApiServiceError;
use crate::server::types::{
    ApiRouteResult, CircuitResponse, CreateCircuitRequest, DeploymentQueuedResponse, DeploymentStatusResponse,
    LegacyDeployRequest, MessageResponse,
};
use crate::types::circuit::{Circuit, CircuitStatus, CircuitUpdates};
use crate::types::jobs::LegacyDeployPayload;
use crate::utils::metrics::ORCHESTRATOR_METRICS;
use crate::worker::service::JobService;

/// Load a circuit, reporting a malformed or unknown id as `not_found`
async fn load_circuit(config: &Config, id: &str, not_found: &str) -> Result<Circuit, ApiServiceError> {
    match CircuitRegistry::get_circuit(config.database(), id).await {
        Ok(circuit) => Ok(circuit),
        Err(RegistryError::NotFound { .. }) => Err(ApiServiceError::NotFound(not_found.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Creates a circuit and schedules its key generation.
///
/// Always creates a new circuit, identical requests are never merged.
#[instrument(skip_all, fields(circuit_id = tracing::field::Empty))]
async fn handle_create_circuit(
    State(config): State<Arc<Config>>,
    body: Result<Json<CreateCircuitRequest>, JsonRejection>,
) -> ApiRouteResult {
    let Json(request) = body.map_err(|rejection| ApiServiceError::BadRequest(rejection.body_text()))?;
    let (template_name, params) = request.validate().map_err(ApiServiceError::BadRequest)?;

    let circuit = CircuitRegistry::create_new_circuit(config.database(), &template_name, params).await?;
    tracing::Span::current().record("circuit_id", circuit.id.to_hex().as_str());

    match circuit.status {
        CircuitStatus::ReadyForDeployment | CircuitStatus::Deploying | CircuitStatus::Deployed => {
            Ok((StatusCode::OK, Json(CircuitResponse::from(circuit))).into_response())
        }
        CircuitStatus::Pending | CircuitStatus::Failed => {
            if let Err(e) = JobService::enqueue_key_generation(&config, &circuit).await {
                error!(error = %e, "Failed to enqueue key generation");
                let message = format!("Failed to enqueue key generation: {}", e);
                CircuitRegistry::transition_circuit(
                    config.database(),
                    circuit.id,
                    &[CircuitStatus::Pending],
                    CircuitUpdates::failed(message),
                )
                .await?;
                return Err(e.into());
            }
            ORCHESTRATOR_METRICS.successful_job_operations.add(1, &[KeyValue::new("operation_type", "enqueue_keygen")]);
            info!(template = %template_name, "Circuit created, key generation enqueued");
            Ok((StatusCode::ACCEPTED, Json(CircuitResponse::from(circuit))).into_response())
        }
    }
}

#[instrument(skip(config), fields(circuit_id = %id))]
async fn handle_get_circuit(Path(id): Path<String>, State(config): State<Arc<Config>>) -> ApiRouteResult {
    let object_id =
        ObjectId::parse_str(&id).map_err(|_| ApiServiceError::BadRequest("Invalid circuit ID format".to_string()))?;
    let circuit = CircuitRegistry::get_circuit_by_object_id(config.database(), object_id).await.map_err(|e| match e {
        RegistryError::NotFound { .. } => ApiServiceError::NotFound("Circuit not found".to_string()),
        e => e.into(),
    })?;
    Ok(Json(CircuitResponse::from(circuit)).into_response())
}

/// Schedules the orchestrated deployment through the Deployment Service
#[instrument(skip(config), fields(circuit_id = %id))]
async fn handle_deploy_circuit(Path(id): Path<String>, State(config): State<Arc<Config>>) -> ApiRouteResult {
    let circuit = load_circuit(&config, &id, "Circuit not found").await?;
    if circuit.status != CircuitStatus::ReadyForDeployment {
        return Err(ApiServiceError::BadRequest(format!(
            "Circuit not ready for deployment. Current status: {}",
            circuit.status
        )));
    }
    if circuit.verifier_key().is_none() {
        return Err(ApiServiceError::BadRequest("Verifier contract not available".to_string()));
    }

    JobService::enqueue_deployment(&config, &circuit.id).await?;
    info!("Circuit deployment enqueued");
    Ok((
        StatusCode::ACCEPTED,
        Json(DeploymentQueuedResponse {
            message: "Circuit deployment enqueued",
            circuit_id: circuit.id.to_hex(),
            status: "deployment_queued",
        }),
    )
        .into_response())
}

/// Schedules a direct deployment signed with the caller's key
#[instrument(skip_all, fields(circuit_id = %id))]
async fn handle_legacy_deploy(
    Path(id): Path<String>,
    State(config): State<Arc<Config>>,
    body: Option<Json<LegacyDeployRequest>>,
) -> ApiRouteResult {
    let circuit = load_circuit(&config, &id, "Not found").await?;
    if circuit.status != CircuitStatus::ReadyForDeployment {
        return Err(ApiServiceError::BadRequest("Circuit not ready".to_string()));
    }
    let Some(artifacts) = circuit.artifacts.filter(|artifacts| artifacts.has_verifier()) else {
        return Err(ApiServiceError::BadRequest("Verifier not available".to_string()));
    };

    let request = body.map(|Json(request)| request).unwrap_or_default();
    let (Some(rpc_url), Some(private_key)) = (
        request.rpc_url.filter(|url| !url.trim().is_empty()),
        request.private_key.filter(|key| !key.trim().is_empty()),
    ) else {
        return Err(ApiServiceError::BadRequest("rpcUrl and privateKey are required".to_string()));
    };
    let rpc_url = Url::parse(rpc_url.trim()).map_err(|_| ApiServiceError::BadRequest("Invalid rpcUrl".to_string()))?;

    JobService::enqueue_legacy_deploy(
        &config,
        LegacyDeployPayload {
            circuit_id: circuit.id.to_hex(),
            artifacts,
            chain_id: request.chain_id,
            rpc_url,
            private_key,
        },
    )
    .await?;
    info!("Legacy deployment enqueued");
    Ok((StatusCode::ACCEPTED, Json(MessageResponse { message: "Deployment enqueued" })).into_response())
}

#[instrument(skip(config), fields(circuit_id = %id))]
async fn handle_get_deployment(Path(id): Path<String>, State(config): State<Arc<Config>>) -> ApiRouteResult {
    let circuit = load_circuit(&config, &id, "Circuit not found").await?;
    Ok(Json(DeploymentStatusResponse {
        circuit_id: circuit.id.to_hex(),
        status: circuit.status,
        deployment: circuit.deployment.map(Into::into),
    })
    .into_response())
}

pub fn circuit_router(config: Arc<Config>) -> Router {
    Router::new()
        .route("/", post(handle_create_circuit))
        .route("/:id", get(handle_get_circuit))
        .route("/:id/deploy", post(handle_deploy_circuit))
        .route("/:id/deploy-legacy", post(handle_legacy_deploy))
        .route("/:id/deployment", get(handle_get_deployment))
        .with_state(config)
}
