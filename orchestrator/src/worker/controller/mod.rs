pub mod event_worker;
pub mod worker_controller;
