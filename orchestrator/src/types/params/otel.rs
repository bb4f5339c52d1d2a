use url::Url;

use crate::cli::instrumentation::InstrumentationCliArgs;

#[derive(Debug, Clone)]
pub struct OTELConfig {
    pub endpoint: Option<Url>,
    pub service_name: String,
}

impl From<InstrumentationCliArgs> for OTELConfig {
    fn from(args: InstrumentationCliArgs) -> Self {
        Self { endpoint: args.otel_collector_endpoint, service_name: args.otel_service_name }
    }
}
