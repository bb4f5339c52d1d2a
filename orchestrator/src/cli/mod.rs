use clap::{Parser, Subcommand};
use provider::aws::AWSConfigCliArgs;

pub mod database;
pub mod deployment;
pub mod instrumentation;
pub mod pipeline;
pub mod provider;
pub mod queue;
pub mod server;
pub mod service;
pub mod storage;

#[derive(Parser, Debug)]
#[command(
    name = "zkflow-orchestrator",
    about = "ZkFlow Orchestrator - circuit key generation, proving and verifier deployment",
    long_about = "ZkFlow Orchestrator renders circuit templates, generates proving keys, produces proofs \
    and deploys verifier contracts through a set of queue-driven workers.\n\n\
    Quick Start:\n  \
    zkflow-orchestrator setup\n  \
    zkflow-orchestrator run",
    after_help = "Examples:\n  \
    zkflow-orchestrator run --port 3000\n  \
    zkflow-orchestrator setup --aws-prefix dev\n  \
    zkflow-orchestrator migrate"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the API server and the queue workers
    Run {
        #[command(flatten)]
        run_command: Box<RunCmd>,
    },
    /// Setup the orchestrator infrastructure
    #[command(long_about = "Create the artifact bucket, one queue per job type and the database indexes.")]
    Setup {
        #[command(flatten)]
        setup_command: Box<SetupCmd>,
    },
    /// Rewrite circuits still carrying the deprecated `ready` status
    Migrate {
        #[command(flatten)]
        migrate_command: Box<MigrateCmd>,
    },
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct RunCmd {
    #[clap(flatten, next_help_heading = None)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub aws_config_args: AWSConfigCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub aws_s3_args: storage::aws_s3::AWSS3CliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub aws_sqs_args: queue::aws_sqs::AWSSQSCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub server_args: server::ServerCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub service_args: service::ServiceCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub pipeline_args: pipeline::PipelineCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub deployment_args: deployment::DeploymentServiceCliArgs,

    #[clap(flatten, next_help_heading = None)]
    pub instrumentation_args: instrumentation::InstrumentationCliArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct SetupCmd {
    // AWS Config
    #[clap(flatten)]
    pub aws_config_args: AWSConfigCliArgs,

    // Storage
    #[clap(flatten)]
    pub aws_s3_args: storage::aws_s3::AWSS3CliArgs,

    // Queue
    #[clap(flatten)]
    pub aws_sqs_args: queue::aws_sqs::AWSSQSCliArgs,

    // Database
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct MigrateCmd {
    #[clap(flatten)]
    pub mongodb_args: database::mongodb::MongoDBCliArgs,
}
