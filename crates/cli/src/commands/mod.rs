//! Subcommand implementations.

pub mod chat;
pub mod doctor;
pub mod tools;

use docent_config::AppConfig;
use std::path::Path;

/// Load configuration from `--config` or the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(p) => AppConfig::load_with_env(p),
        None => AppConfig::load(),
    };
    config.map_err(|e| format!("Failed to load config: {e}").into())
}
