//! Configuration loading, validation, and management for Docent.
//!
//! Loads configuration from `~/.docent/config.toml` (or an explicit path).
//! The API key may instead come from `ANTHROPIC_API_KEY`. A missing file
//! means defaults; an unreadable or invalid one is an error.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the model API credential.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

/// The root configuration structure.
///
/// Maps directly to `~/.docent/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the model endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of an Anthropic-compatible Messages API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Maximum tokens per model response
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Sampling temperature; endpoint default when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum model turns per user request before giving up
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// HTTP timeout for one model call
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Replaces the built-in system prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Document library settings
    #[serde(default)]
    pub library: LibraryConfig,
}

fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_base_url() -> String {
    "https://api.anthropic.com".into()
}
fn default_max_output_tokens() -> u32 {
    8192
}
fn default_max_turns() -> u32 {
    25
}
fn default_request_timeout_secs() -> u64 {
    300
}

fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("temperature", &self.temperature)
            .field("max_turns", &self.max_turns)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("system_prompt", &self.system_prompt.as_ref().map(|p| p.len()))
            .field("library", &self.library)
            .finish()
    }
}

/// Where the documents live and how much of each is returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Root of the markdown documentation corpus
    #[serde(default = "default_docs_dir")]
    pub docs_dir: PathBuf,

    /// Root of the scraped web-page corpus
    #[serde(default = "default_web_dir")]
    pub web_dir: PathBuf,

    /// Characters returned per document before truncation
    #[serde(default = "default_max_document_chars")]
    pub max_document_chars: usize,

    /// Replacement tool catalog (TOML); the built-in catalog when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

fn default_docs_dir() -> PathBuf {
    PathBuf::from("./docs")
}
fn default_web_dir() -> PathBuf {
    PathBuf::from("./web")
}
fn default_max_document_chars() -> usize {
    15_000
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            web_dir: default_web_dir(),
            max_document_chars: default_max_document_chars(),
            catalog: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.docent/config.toml).
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load configuration from `path`, then apply the API key from the
    /// environment when the file does not set one.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_ENV).ok().filter(|k| !k.is_empty());
        }
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".docent")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_turns == 0 {
            return Err(ConfigError::ValidationError(
                "max_turns must be at least 1".into(),
            ));
        }
        if self.max_output_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_output_tokens must be at least 1".into(),
            ));
        }
        if self.library.max_document_chars == 0 {
            return Err(ConfigError::ValidationError(
                "library.max_document_chars must be at least 1".into(),
            ));
        }
        if let Some(t) = self.temperature
            && !(0.0..=1.0).contains(&t)
        {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 1.0".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            max_output_tokens: default_max_output_tokens(),
            temperature: None,
            max_turns: default_max_turns(),
            request_timeout_secs: default_request_timeout_secs(),
            system_prompt: None,
            library: LibraryConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
