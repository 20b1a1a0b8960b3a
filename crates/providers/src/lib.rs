//! Streaming model providers for Docent.
//!
//! All providers implement the `docent_core::Provider` trait. The only
//! wire protocol spoken is the Anthropic Messages API; compatible vendors
//! are reached by changing `base_url`.

pub mod anthropic;
pub mod sse;

pub use anthropic::AnthropicProvider;

use docent_config::AppConfig;
use docent_core::error::ProviderError;
use docent_core::provider::Provider;
use std::sync::Arc;
use std::time::Duration;

/// Build the configured provider.
///
/// Fails with `NotConfigured` when no API key is available.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let api_key = config.api_key.clone().ok_or_else(|| {
        ProviderError::NotConfigured(format!(
            "no API key; set api_key in {} or {}",
            AppConfig::config_path().display(),
            docent_config::API_KEY_ENV
        ))
    })?;

    let provider = AnthropicProvider::new(
        api_key,
        Duration::from_secs(config.request_timeout_secs),
    )?
    .with_base_url(&config.base_url);

    tracing::debug!(base_url = %provider.base_url(), model = %config.model, "Provider ready");
    Ok(Arc::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_without_key_fails() {
        let config = AppConfig::default();
        let err = build_from_config(&config).err().unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn build_with_key() {
        let config = AppConfig {
            api_key: Some("sk-ant-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "anthropic");
    }
}
