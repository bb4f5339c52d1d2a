use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use super::types::ApiResponse;
use crate::core::client::database::DatabaseError;
use crate::error::job::JobError;
use crate::registry::RegistryError;

pub type ApiServiceResult<T> = Result<T, ApiServiceError>;

/// Errors returned by the route handlers.
///
/// Every variant renders as `{"success": false, "message": ...}`:
/// * `BadRequest` - 400 Bad Request
/// * `NotFound` - 404 Not Found
/// * `Internal` - 500 Internal Server Error, the detail is logged and never returned
#[derive(Debug, thiserror::Error)]
pub enum ApiServiceError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiServiceError {
    fn into_response(self) -> Response {
        match self {
            ApiServiceError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ApiResponse::error(message))).into_response()
            }
            ApiServiceError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ApiResponse::error(message))).into_response()
            }
            ApiServiceError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(ApiResponse::error("Internal server error".to_string())))
                    .into_response()
            }
        }
    }
}

impl From<DatabaseError> for ApiServiceError {
    fn from(e: DatabaseError) -> Self {
        ApiServiceError::Internal(e.to_string())
    }
}

impl From<JobError> for ApiServiceError {
    fn from(e: JobError) -> Self {
        ApiServiceError::Internal(e.to_string())
    }
}

impl From<RegistryError> for ApiServiceError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NotFound { .. } => ApiServiceError::NotFound(e.to_string()),
            RegistryError::StoreUnavailable(e) => e.into(),
        }
    }
}
