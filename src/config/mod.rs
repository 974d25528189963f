//! YAML configuration.

mod loader;
mod types;

pub use types::{BrokerConfig, Config, ServerConfig, TelemetryConfig};
