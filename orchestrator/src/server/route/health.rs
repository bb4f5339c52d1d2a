use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use tracing::warn;

use crate::core::config::Config;
use crate::server::types::{ApiRouteResult, HealthResponse, ReadinessResponse};

/// Liveness
async fn handle_health(State(config): State<Arc<Config>>) -> ApiRouteResult {
    Ok(Json(HealthResponse { status: "ok", uptime_s: config.uptime().as_secs() }).into_response())
}

/// Readiness: the persistent store, the queue broker and the blob store must all answer
async fn handle_ready(State(config): State<Arc<Config>>) -> ApiRouteResult {
    let (database, queue, storage) =
        tokio::join!(config.database().health_check(), config.queue().health_check(), config.storage().health_check());

    let mut failing = Vec::new();
    if let Err(e) = database {
        warn!(error = %e, "Database health check failed");
        failing.push("database");
    }
    if let Err(e) = queue {
        warn!(error = %e, "Queue health check failed");
        failing.push("queue");
    }
    if let Err(e) = storage {
        warn!(error = %e, "Storage health check failed");
        failing.push("storage");
    }

    if failing.is_empty() {
        Ok(Json(ReadinessResponse { status: "ok", failing }).into_response())
    } else {
        Ok((StatusCode::SERVICE_UNAVAILABLE, Json(ReadinessResponse { status: "unavailable", failing })).into_response())
    }
}

pub fn health_router(config: Arc<Config>) -> Router {
    Router::new().route("/", get(handle_health)).route("/ready", get(handle_ready)).with_state(config)
}
