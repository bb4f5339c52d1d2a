use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;

use crate::utils::metrics::{encode_metrics, PROCESS_METRICS};

/// Prometheus scrape endpoint
pub(crate) async fn handle_metrics() -> Response {
    match encode_metrics(&PROCESS_METRICS) {
        Ok((content_type, body)) => ([(CONTENT_TYPE, content_type)], body).into_response(),
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics error").into_response()
        }
    }
}
