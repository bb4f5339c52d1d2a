use clap::Args;

/// Parameters used to config AWS S3.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct AWSS3CliArgs {
    /// The name of the S3 bucket holding circuit artifacts.
    #[arg(env = "ZKFLOW_AWS_S3_BUCKET_IDENTIFIER", long, default_value = "zkflow-dev")]
    pub bucket_identifier: String,
}
