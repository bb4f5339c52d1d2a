use clap::Args;

fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if value == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(value)
}

#[derive(Debug, Clone, Args)]
pub struct ServiceCliArgs {
    /// Number of key generation jobs a worker runs concurrently.
    #[arg(env = "ZKFLOW_KEYGEN_CONCURRENCY", long, value_parser = parse_positive_usize)]
    pub keygen_concurrency: Option<usize>,

    /// Number of proof generation jobs a worker runs concurrently.
    #[arg(env = "ZKFLOW_PROOF_CONCURRENCY", long, value_parser = parse_positive_usize)]
    pub proof_concurrency: Option<usize>,

    /// Number of deployment jobs a worker runs concurrently.
    #[arg(env = "ZKFLOW_DEPLOYMENT_CONCURRENCY", long, value_parser = parse_positive_usize)]
    pub deployment_concurrency: Option<usize>,

    /// Number of legacy deploy jobs a worker runs concurrently.
    #[arg(env = "ZKFLOW_LEGACY_DEPLOY_CONCURRENCY", long, value_parser = parse_positive_usize)]
    pub legacy_deploy_concurrency: Option<usize>,

    /// Start the queue workers next to the API server.
    #[arg(env = "ZKFLOW_WORKERS_ENABLED", long, default_value_t = true, action = clap::ArgAction::Set)]
    pub workers_enabled: bool,
}
