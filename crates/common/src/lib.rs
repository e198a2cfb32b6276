//! Shared building blocks: KIS environment selection, layered configuration,
//! logging setup and atomic JSON file writes.

mod config;
mod environment;
mod logging;
mod persist;

pub use config::{
    AccountConfig, AppConfig, ConfigError, ConfigLoader, DEFAULT_CONFIG_FILE, DEFAULT_STATE_FILE,
    DEFAULT_TOKEN_FILE,
};
pub use environment::{KisEnvironment, ParseEnvironmentError};
pub use logging::init_logging;
pub use persist::write_json_atomic;
