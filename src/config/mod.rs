//! Configuration loading and validation.

mod loader;
mod types;

pub use types::{ApiConfig, BrokerConfig, Config, Settings, ShutdownConfig};
