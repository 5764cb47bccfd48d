//! Configuration module for assetpipe
//!
//! Provides types and parsing for `assetpipe.toml` project configuration.

pub mod loader;
pub mod schema;

pub use loader::{default_config, load_config, ConfigError, CONFIG_FILENAME};
pub use schema::*;
