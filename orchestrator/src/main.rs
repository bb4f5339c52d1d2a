use clap::Parser as _;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use zkflow_orchestrator::cli::{Cli, Commands, MigrateCmd, RunCmd, SetupCmd};
use zkflow_orchestrator::core::config::Config;
use zkflow_orchestrator::server::setup_server;
use zkflow_orchestrator::setup::migrate::migrate;
use zkflow_orchestrator::setup::setup;
use zkflow_orchestrator::types::params::otel::OTELConfig;
use zkflow_orchestrator::utils::instrument::OrchestratorInstrumentation;
use zkflow_orchestrator::utils::logging::init_logging;
use zkflow_orchestrator::utils::signal_handler::SignalHandler;
use zkflow_orchestrator::worker::initialize_worker;
use zkflow_orchestrator::{OrchestratorError, OrchestratorResult};

/// In-flight jobs get this long to finish once a shutdown signal arrived
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    dotenv().ok();
    if let Err(e) = init_logging() {
        report_startup_failure(&e);
        std::process::exit(1);
    }
    info!("Starting orchestrator");
    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Run { run_command } => {
            info!("Executing run command");
            run_orchestrator(run_command).await
        }
        Commands::Setup { setup_command } => {
            info!("Executing setup command");
            setup_orchestrator(setup_command).await
        }
        Commands::Migrate { migrate_command } => {
            info!("Executing migrate command");
            migrate_orchestrator(migrate_command).await
        }
    };

    if let Err(e) = result {
        error!(error = %e, error_chain = ?e, "Orchestrator command failed");
        std::process::exit(1);
    }
}

async fn run_orchestrator(run_cmd: &RunCmd) -> OrchestratorResult<()> {
    let instrumentation = OrchestratorInstrumentation::new(&OTELConfig::from(run_cmd.instrumentation_args.clone()))?;
    let config = Arc::new(Config::from_run_cmd(run_cmd).await?);
    debug!("Configuration initialized");

    let (address, server_handle) = setup_server(config.clone()).await?;
    info!(%address, "Application router initialized");

    let shutdown_token = CancellationToken::new();
    let worker_controller = initialize_worker(config.clone(), shutdown_token.clone()).await?;

    let signal_handler = SignalHandler::new(shutdown_token);
    let signal = signal_handler.wait_for_shutdown().await?;
    info!(signal = %signal, "Orchestrator service shutting down");

    signal_handler
        .handle_graceful_shutdown(
            async {
                worker_controller.shutdown().await?;
                server_handle.shutdown().await.map_err(|e| OrchestratorError::ServerError(e.to_string()))?;
                Ok::<(), OrchestratorError>(())
            },
            SHUTDOWN_TIMEOUT,
        )
        .await?;
    instrumentation.shutdown()?;
    info!("Orchestrator service stopped");
    Ok(())
}

/// setup_orchestrator - Creates the bucket, queues and indexes the service needs
async fn setup_orchestrator(setup_cmd: &SetupCmd) -> OrchestratorResult<()> {
    setup(setup_cmd).await?;
    info!("Orchestrator setup completed successfully");
    Ok(())
}

async fn migrate_orchestrator(migrate_cmd: &MigrateCmd) -> OrchestratorResult<()> {
    let migrated = migrate(migrate_cmd).await?;
    info!(migrated, "Migration completed");
    Ok(())
}

/// No subscriber is installed yet, stderr is all we have
#[allow(clippy::print_stderr)]
fn report_startup_failure(error: &OrchestratorError) {
    eprintln!("Failed to initialise logging: {}", error);
}
