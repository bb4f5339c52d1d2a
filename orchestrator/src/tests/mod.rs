pub mod common;
pub mod workers;
