use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum DeploymentServiceError {
    /// Network/transport errors that may be retryable (timeouts, refused connections, etc.)
    #[error("Network error during {operation}: {message}")]
    NetworkError { operation: String, message: String },

    /// The service answered with a non-success HTTP status
    #[error("Deployment API error during {operation} (status {status}): {message}")]
    ApiError { operation: String, status: StatusCode, message: String },

    /// The service answered 2xx but flagged the request as unsuccessful
    #[error("Deployment API returned error: {message}")]
    Rejected { operation: String, message: String },

    /// JSON parsing errors or missing fields in an otherwise valid response
    #[error("Failed to parse response during {operation}: {message}")]
    ParseError { operation: String, message: String },

    #[error("Failed to build URL for {operation}: {message}")]
    UrlError { operation: String, message: String },
}

impl DeploymentServiceError {
    /// Check if this error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            DeploymentServiceError::NetworkError { .. } => true,
            DeploymentServiceError::ApiError { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Get error type as a string for metrics
    pub fn error_type(&self) -> &'static str {
        match self {
            DeploymentServiceError::NetworkError { .. } => "network_error",
            DeploymentServiceError::ApiError { .. } => "api_error",
            DeploymentServiceError::Rejected { .. } => "rejected",
            DeploymentServiceError::ParseError { .. } => "parse_error",
            DeploymentServiceError::UrlError { .. } => "url_error",
        }
    }

    /// Create an error from a reqwest error, keeping transport failures retryable
    pub fn from_reqwest_error(operation: impl Into<String>, source: reqwest::Error) -> Self {
        let operation = operation.into();

        if source.is_timeout() {
            DeploymentServiceError::NetworkError { operation, message: "request timed out".to_string() }
        } else if source.is_connect() {
            DeploymentServiceError::NetworkError { operation, message: format!("connection failed: {}", source) }
        } else if source.is_decode() {
            DeploymentServiceError::ParseError { operation, message: source.to_string() }
        } else if let Some(status) = source.status() {
            DeploymentServiceError::ApiError { operation, status, message: source.to_string() }
        } else {
            DeploymentServiceError::NetworkError { operation, message: source.to_string() }
        }
    }
}
