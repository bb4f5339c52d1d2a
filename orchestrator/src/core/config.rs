use std::time::Instant;

use zkflow_deployment_service::{DeploymentService, DeploymentServiceClient};

use crate::cli::RunCmd;
use crate::core::client::{
    AlloyDeployer, CircuitToolchain, ContractDeployer, DatabaseClient, MongoDbClient, QueueClient, SnarkjsToolchain,
    StorageClient, AWSS3, SQS,
};
use crate::core::cloud::CloudProvider;
use crate::types::params::database::DatabaseArgs;
use crate::types::params::deployment::{DeploymentPollParams, DeploymentServiceParams};
use crate::types::params::pipeline::PipelineParams;
use crate::types::params::service::{ServerParams, ServiceParams};
use crate::types::params::{AWSConfigParams, QueueArgs, StorageArgs};
use crate::{OrchestratorError, OrchestratorResult};

pub struct OrchestratorParams {
    pub service_config: ServiceParams,
    pub server_config: ServerParams,
    pub pipeline_config: PipelineParams,
    pub deployment_poll: DeploymentPollParams,
}

/// The app config. Built once at start-up and shared as `Arc<Config>` by the
/// server and every worker.
pub struct Config {
    /// The orchestrator config
    params: OrchestratorParams,
    /// The database client
    database: Box<dyn DatabaseClient>,
    /// Queue client
    queue: Box<dyn QueueClient>,
    /// Storage client
    storage: Box<dyn StorageClient>,
    /// Compiler, key ceremony and prover
    toolchain: Box<dyn CircuitToolchain>,
    /// Local signer used by the legacy deploy path
    deployer: Box<dyn ContractDeployer>,
    /// External deployment service
    deployment_service: Box<dyn DeploymentService>,
    started_at: Instant,
}

impl Config {
    pub fn new(
        params: OrchestratorParams,
        database: Box<dyn DatabaseClient>,
        queue: Box<dyn QueueClient>,
        storage: Box<dyn StorageClient>,
        toolchain: Box<dyn CircuitToolchain>,
        deployer: Box<dyn ContractDeployer>,
        deployment_service: Box<dyn DeploymentService>,
    ) -> Self {
        Self { params, database, queue, storage, toolchain, deployer, deployment_service, started_at: Instant::now() }
    }

    /// Setup the orchestrator
    pub async fn from_run_cmd(run_cmd: &RunCmd) -> OrchestratorResult<Self> {
        let aws_params = AWSConfigParams::from(run_cmd.aws_config_args.clone());
        let provider_config = CloudProvider::from_params(&aws_params).await;
        let aws_config = provider_config.get_aws_config();

        let db: DatabaseArgs = run_cmd.mongodb_args.clone().into();
        let storage_args = StorageArgs::try_from(run_cmd.clone())?;
        let queue_args = QueueArgs::try_from(run_cmd.clone())?;
        let deployment_service_params = DeploymentServiceParams::from(&run_cmd.deployment_args);

        let params = OrchestratorParams {
            service_config: run_cmd.service_args.clone().into(),
            server_config: run_cmd.server_args.clone().into(),
            pipeline_config: run_cmd.pipeline_args.clone().into(),
            deployment_poll: DeploymentPollParams::from(&run_cmd.deployment_args),
        };

        let database = MongoDbClient::new(&db).await?;
        // fail fast: an unreachable store is fatal at start-up
        database.health_check().await?;

        let toolchain = SnarkjsToolchain::new(&params.pipeline_config)
            .map_err(|e| OrchestratorError::ConfigError(format!("Invalid toolchain command: {}", e)))?;

        Ok(Self::new(
            params,
            Box::new(database),
            Box::new(SQS::new(aws_config, &queue_args)),
            Box::new(AWSS3::new(aws_config, &storage_args)),
            Box::new(toolchain),
            Box::new(AlloyDeployer::new()),
            Box::new(DeploymentServiceClient::new(
                deployment_service_params.base_url,
                deployment_service_params.timeouts,
            )),
        ))
    }

    /// Returns the server config
    pub fn server_config(&self) -> &ServerParams {
        &self.params.server_config
    }

    /// Returns the service config
    pub fn service_config(&self) -> &ServiceParams {
        &self.params.service_config
    }

    /// Returns the pipeline paths and commands
    pub fn pipeline_config(&self) -> &PipelineParams {
        &self.params.pipeline_config
    }

    /// Returns the deployment polling budget
    pub fn deployment_poll(&self) -> &DeploymentPollParams {
        &self.params.deployment_poll
    }

    /// Returns the database client
    pub fn database(&self) -> &dyn DatabaseClient {
        self.database.as_ref()
    }

    /// Returns the queue provider
    pub fn queue(&self) -> &dyn QueueClient {
        self.queue.as_ref()
    }

    /// Returns the storage provider
    pub fn storage(&self) -> &dyn StorageClient {
        self.storage.as_ref()
    }

    pub fn toolchain(&self) -> &dyn CircuitToolchain {
        self.toolchain.as_ref()
    }

    pub fn deployer(&self) -> &dyn ContractDeployer {
        self.deployer.as_ref()
    }

    pub fn deployment_service(&self) -> &dyn DeploymentService {
        self.deployment_service.as_ref()
    }

    /// Time elapsed since the config was built
    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }
}
