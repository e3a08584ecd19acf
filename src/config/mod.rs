// src/config/mod.rs
//! Configuration management for the coordinator
//!
//! Values are layered: built-in defaults, an optional TOML file,
//! environment variables (a `.env` file is honored), then command-line
//! overrides.

/// Core configuration implementation
pub mod config;

pub use config::{Config, StoreKind};

use crate::utils::error::CoordinatorError;
use std::path::Path;

/// Loads the effective configuration
///
/// # Arguments
/// * `path` - Optional TOML file; without it the defaults are the base
///
/// # Returns
/// * `Ok(Config)` - Validated configuration
/// * `Err(CoordinatorError)` - If the file, an environment value or the
///   resulting configuration is invalid
pub fn load(path: Option<&Path>) -> Result<Config, CoordinatorError> {
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.apply_env()?;
    Ok(config)
}

/// Generates a commented configuration template
pub fn generate_template() -> String {
    Config::generate_template()
}
