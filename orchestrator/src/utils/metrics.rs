use once_cell::sync::Lazy;
use opentelemetry::global;
use opentelemetry::metrics::{Counter, Histogram, Meter};
use prometheus::{Encoder, Registry, TextEncoder};
use tracing::warn;

pub static ORCHESTRATOR_METRICS: Lazy<OrchestratorMetrics> = Lazy::new(OrchestratorMetrics::register);

/// Registry scraped on `GET /metrics`
pub static PROCESS_METRICS: Lazy<Registry> = Lazy::new(process_registry);

fn process_registry() -> Registry {
    let registry = Registry::new();
    register_process_collector(&registry);
    registry
}

#[cfg(target_os = "linux")]
fn register_process_collector(registry: &Registry) {
    if let Err(e) = registry.register(Box::new(prometheus::process_collector::ProcessCollector::for_self())) {
        warn!(error = %e, "Failed to register the process collector");
    }
}

#[cfg(not(target_os = "linux"))]
fn register_process_collector(_registry: &Registry) {}

/// Encode every metric family of `registry` in the Prometheus text format.
/// Returns the content type to answer with and the body.
pub fn encode_metrics(registry: &Registry) -> Result<(String, Vec<u8>), prometheus::Error> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok((encoder.format_type().to_string(), buffer))
}

pub struct OrchestratorMetrics {
    pub successful_job_operations: Counter<u64>,
    pub failed_job_operations: Counter<u64>,
    pub jobs_response_time: Histogram<f64>,
    pub db_calls_response_time: Histogram<f64>,
    pub deployment_outcomes: Counter<u64>,
}

impl OrchestratorMetrics {
    pub fn register() -> Self {
        let meter: Meter = global::meter("crates.orchestrator.opentelemetry");

        let successful_job_operations = meter
            .u64_counter("successful_job_operations")
            .with_description("Count of successful job operations over time")
            .with_unit("jobs")
            .init();

        let failed_job_operations = meter
            .u64_counter("failed_job_operations")
            .with_description("Count of failed job operations over time")
            .with_unit("jobs")
            .init();

        let jobs_response_time = meter
            .f64_histogram("jobs_response_time")
            .with_description("Response time of jobs over time")
            .with_unit("s")
            .init();

        let db_calls_response_time = meter
            .f64_histogram("db_calls_response_time")
            .with_description("Response time of DB calls over time")
            .with_unit("s")
            .init();

        let deployment_outcomes = meter
            .u64_counter("deployment_outcomes")
            .with_description("Terminal deployment outcomes, by path and result")
            .with_unit("deployments")
            .init();

        Self {
            successful_job_operations,
            failed_job_operations,
            jobs_response_time,
            db_calls_response_time,
            deployment_outcomes,
        }
    }
}
