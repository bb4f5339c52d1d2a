use clap::Args;
use url::Url;

/// Parameters used to config instrumentation.
#[derive(Debug, Clone, Args)]
#[group()]
pub struct InstrumentationCliArgs {
    /// The name of the instrumentation service.
    #[arg(env = "ZKFLOW_OTEL_SERVICE_NAME", long, default_value = "zkflow_orchestrator")]
    pub otel_service_name: String,

    /// The endpoint of the OTLP collector. Metrics are only exported when it is set.
    #[arg(env = "ZKFLOW_OTEL_COLLECTOR_ENDPOINT", long)]
    pub otel_collector_endpoint: Option<Url>,
}
