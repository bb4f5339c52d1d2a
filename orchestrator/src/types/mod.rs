pub mod circuit;
pub mod constant;
pub mod jobs;
pub mod params;
pub mod proof_request;
pub mod queue;
pub mod queue_control;
pub mod templates;
