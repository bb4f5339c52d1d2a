pub mod error;
pub mod middleware;
pub mod route;
pub mod types;

use crate::core::config::Config;
use crate::types::params::service::ServerParams;
use crate::{server::route::server_router, OrchestratorError, OrchestratorResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub use error::{ApiServiceError, ApiServiceResult};

/// Handle for managing the HTTP server lifecycle.
pub struct ServerHandle {
    shutdown_token: CancellationToken,
    task_handle: JoinHandle<()>,
}

impl ServerHandle {
    /// Stops accepting connections, lets in-flight requests finish and waits for the server to stop.
    pub async fn shutdown(self) -> Result<(), tokio::task::JoinError> {
        info!("Initiating server graceful shutdown");
        self.shutdown_token.cancel();
        self.task_handle.await
    }
}

/// Binds the listener and serves the API in a separate task.
///
/// # Returns
/// * `(SocketAddr, ServerHandle)` - The bound address and handle for managing the server
pub async fn setup_server(config: Arc<Config>) -> OrchestratorResult<(SocketAddr, ServerHandle)> {
    let (api_server_url, listener) = get_server_url(config.server_config()).await?;

    let shutdown_token = CancellationToken::new();
    let server_token = shutdown_token.clone();

    let app = server_router(config.clone());
    let task_handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(server_token.cancelled_owned()).await {
            error!(error = %e, "API server stopped with an error");
        }
    });
    info!(address = %api_server_url, "API server listening");

    Ok((api_server_url, ServerHandle { shutdown_token, task_handle }))
}

pub(crate) async fn get_server_url(
    server_params: &ServerParams,
) -> OrchestratorResult<(SocketAddr, tokio::net::TcpListener)> {
    // tests bind a random free port
    let port = if cfg!(test) { 0 } else { server_params.port };

    let address = format!("{}:{}", server_params.host, port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .map_err(|e| OrchestratorError::ServerError(format!("Failed to bind {}: {}", address, e)))?;
    let api_server_url = listener.local_addr()?;

    Ok((api_server_url, listener))
}
