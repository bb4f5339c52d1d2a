pub mod hashing;
pub mod instrument;
pub mod logging;
pub mod metrics;
pub mod scratch;
pub mod signal_handler;
pub mod template;
pub mod timer;
