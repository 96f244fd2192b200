//! Infrastructure layer
//!
//! Application configuration and logging setup.

mod config;
mod logging;

pub use config::{CONFIG_ENV, Config, ConfigError};
pub use logging::init_logging;
