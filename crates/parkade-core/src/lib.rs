pub mod config;
pub mod error;
pub mod lot;
pub mod telemetry;
