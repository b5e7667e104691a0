pub mod config;
pub mod connectors;
pub mod encoder;
pub mod error;
pub mod metrics;
pub mod progress;
pub mod retry;
