use std::time::Duration;

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal::unix::{signal, SignalKind};

use crate::{OrchestratorError, OrchestratorResult};

/// Signal types that can trigger shutdown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    /// SIGTERM - Docker/Kubernetes graceful shutdown
    Terminate,
    /// SIGINT - Ctrl+C interactive shutdown
    Interrupt,
    /// Internal - the server or a worker stopped on its own
    Internal,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
            ShutdownSignal::Interrupt => write!(f, "SIGINT"),
            ShutdownSignal::Internal => write!(f, "INTERNAL"),
        }
    }
}

/// Waits for a process signal or for the shared token to be cancelled from inside the app.
pub struct SignalHandler {
    token: CancellationToken,
}

impl SignalHandler {
    pub fn new(token: CancellationToken) -> Self {
        Self { token }
    }

    /// Wait for any shutdown signal, cancel the shared token and return which one was received
    pub async fn wait_for_shutdown(&self) -> OrchestratorResult<ShutdownSignal> {
        let signal = self.wait_for_signal().await?;
        info!(signal = %signal, "Received shutdown signal");
        self.token.cancel();
        Ok(signal)
    }

    #[cfg(unix)]
    async fn wait_for_signal(&self) -> OrchestratorResult<ShutdownSignal> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        Ok(tokio::select! {
            _ = sigterm.recv() => ShutdownSignal::Terminate,
            _ = sigint.recv() => ShutdownSignal::Interrupt,
            _ = self.token.cancelled() => {
                warn!("Internal application shutdown requested");
                ShutdownSignal::Internal
            }
        })
    }

    #[cfg(not(unix))]
    async fn wait_for_signal(&self) -> OrchestratorResult<ShutdownSignal> {
        Ok(tokio::select! {
            result = signal::ctrl_c() => {
                result?;
                ShutdownSignal::Interrupt
            }
            _ = self.token.cancelled() => {
                warn!("Internal application shutdown requested");
                ShutdownSignal::Internal
            }
        })
    }

    /// Run `shutdown` with an upper bound on how long it may take
    pub async fn handle_graceful_shutdown<Fut>(&self, shutdown: Fut, timeout: Duration) -> OrchestratorResult<()>
    where
        Fut: std::future::Future<Output = OrchestratorResult<()>>,
    {
        info!(timeout_secs = timeout.as_secs(), "Starting graceful shutdown");
        match tokio::time::timeout(timeout, shutdown).await {
            Ok(Ok(())) => {
                info!("Graceful shutdown completed successfully");
                Ok(())
            }
            Ok(Err(e)) => {
                error!(error = %e, "Graceful shutdown failed");
                Err(e)
            }
            Err(_) => {
                warn!("Shutdown timeout reached, some jobs may be left incomplete");
                Err(OrchestratorError::RunCommandError(format!(
                    "Shutdown timeout of {}s exceeded",
                    timeout.as_secs()
                )))
            }
        }
    }
}
