use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};
use mongodb::bson::oid::ObjectId;
use tracing::{info, instrument, warn, Span};

use crate::core::client::database::DatabaseClient;
use crate::core::config::Config;
use crate::registry::{CircuitRegistry, RegistryError, RegistryResult};
use crate::server::error::ApiServiceError;
use crate::server::types::{ApiRouteResult, DeploymentWebhookRequest, WebhookResponse};
use crate::types::circuit::{CircuitStatus, CircuitUpdates};
use crate::types::constant::DEFAULT_WEBHOOK_FAILURE_MESSAGE;
use crate::worker::event_handler::jobs::deployment::{parse_deployed_at, record_deployment_outcome};

/// What a status notification asks for
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum WebhookOutcome {
    Deployed(CircuitUpdates),
    Failed(CircuitUpdates),
    Ignored,
}

pub(crate) fn webhook_outcome(request: &DeploymentWebhookRequest) -> WebhookOutcome {
    let contract_address = request.contract_address.as_deref().filter(|address| !address.is_empty());
    match (request.status.as_deref(), contract_address) {
        (Some("deployed"), Some(address)) => WebhookOutcome::Deployed(CircuitUpdates::deployed(
            address.to_string(),
            request.tx_hash.clone(),
            parse_deployed_at(request.deployed_at.as_deref()),
        )),
        (Some("failed" | "error"), _) => WebhookOutcome::Failed(CircuitUpdates::deployment_failed(
            request.error.clone().unwrap_or_else(|| DEFAULT_WEBHOOK_FAILURE_MESSAGE.to_string()),
        )),
        _ => WebhookOutcome::Ignored,
    }
}

/// Apply a notification to a circuit that is still being deployed.
///
/// Terminal circuits are left untouched, so replaying a notification changes nothing.
/// Returns whether the circuit was updated.
pub(crate) async fn apply_webhook_outcome(
    db: &dyn DatabaseClient,
    circuit_id: ObjectId,
    outcome: WebhookOutcome,
) -> RegistryResult<bool> {
    let (update, label) = match outcome {
        WebhookOutcome::Deployed(update) => (update, "deployed"),
        WebhookOutcome::Failed(update) => (update, "failed"),
        WebhookOutcome::Ignored => return Ok(false),
    };
    let updated = CircuitRegistry::transition_circuit(
        db,
        circuit_id,
        &[CircuitStatus::ReadyForDeployment, CircuitStatus::Deploying],
        update,
    )
    .await?;
    if updated.is_some() {
        record_deployment_outcome("webhook", label);
    }
    Ok(updated.is_some())
}

#[instrument(skip_all, fields(circuit_id = tracing::field::Empty))]
async fn handle_deployment_status(
    State(config): State<Arc<Config>>,
    body: Result<Json<DeploymentWebhookRequest>, JsonRejection>,
) -> ApiRouteResult {
    let Json(request) = body.map_err(|rejection| ApiServiceError::BadRequest(rejection.body_text()))?;
    let Some(circuit_id) = request.circuit_id.clone().filter(|id| !id.is_empty()) else {
        return Err(ApiServiceError::BadRequest("circuitId is required".to_string()));
    };
    Span::current().record("circuit_id", circuit_id.as_str());

    let circuit = CircuitRegistry::get_circuit(config.database(), &circuit_id).await.map_err(|e| match e {
        RegistryError::NotFound { .. } => ApiServiceError::NotFound("Circuit not found".to_string()),
        e => e.into(),
    })?;
    info!(status = ?request.status, "Received deployment status update");

    let outcome = webhook_outcome(&request);
    if outcome == WebhookOutcome::Ignored {
        warn!(status = ?request.status, "Ignoring deployment status update");
    } else if apply_webhook_outcome(config.database(), circuit.id, outcome).await? {
        info!(status = ?request.status, "Circuit deployment status updated");
    } else {
        info!(current = %circuit.status, "Circuit is not being deployed, status update ignored");
    }

    Ok(Json(WebhookResponse { message: "Status update processed", circuit_id, status: request.status }).into_response())
}

pub fn webhook_router(config: Arc<Config>) -> Router {
    Router::new().route("/deployment-status", post(handle_deployment_status)).with_state(config)
}
