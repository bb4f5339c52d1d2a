use crate::core::config::Config;
use crate::server::middleware::security_headers;
use crate::server::types::ApiResponse;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use circuits::circuit_router;
use health::health_router;
use metrics::handle_metrics;
use proofs::proof_router;
use std::sync::Arc;
use templates::template_router;
use webhooks::webhook_router;

pub(super) mod circuits;
pub(super) mod health;
pub(super) mod metrics;
pub(super) mod proofs;
pub(super) mod templates;
pub(super) mod webhooks;

/// Fallback for unknown routes
pub async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Json(ApiResponse::error("The requested resource was not found".to_string())))
}

fn v1_route(config: Arc<Config>) -> Router {
    Router::new()
        .nest("/circuits", circuit_router(config.clone()))
        .nest("/proofs", proof_router(config.clone()))
        .nest("/templates", template_router())
        .nest("/webhooks", webhook_router(config))
}

pub(crate) fn server_router(config: Arc<Config>) -> Router {
    Router::new()
        .nest("/v1", v1_route(config.clone()))
        .nest("/health", health_router(config))
        .route("/metrics", get(handle_metrics))
        .fallback(handler_404)
        .layer(axum::middleware::from_fn(security_headers))
}
