//! LLM Provider implementations for Scoutline.
//!
//! All providers implement the `scoutline_core::Provider` trait.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;

use scoutline_config::AppConfig;
use scoutline_core::error::ProviderError;
use scoutline_core::provider::Provider;
use std::sync::Arc;

/// Build the configured provider.
///
/// Endpoints on localhost are allowed without a key; everything else
/// needs one.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ProviderError> {
    let name = provider_name(&config.provider_url);
    let api_key = match (&config.api_key, is_local(&config.provider_url)) {
        (Some(key), _) => key.clone(),
        (None, true) => String::new(),
        (None, false) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key for {}; set SCOUTLINE_API_KEY or api_key in config.toml",
                config.provider_url
            )));
        }
    };

    tracing::debug!(provider = %name, url = %config.provider_url, "Building provider");
    Ok(Arc::new(OpenAiCompatProvider::new(name, &config.provider_url, api_key)))
}

/// Derive a short provider name from the endpoint URL.
fn provider_name(url: &str) -> &'static str {
    if url.contains("openrouter.ai") {
        "openrouter"
    } else if url.contains("api.openai.com") {
        "openai"
    } else if url.contains(":11434") {
        "ollama"
    } else {
        "custom"
    }
}

/// Whether `url` points at this machine, where no API key is needed.
pub fn is_local(url: &str) -> bool {
    url.contains("://localhost") || url.contains("://127.0.0.1")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_without_key_is_not_configured() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(ProviderError::NotConfigured(_))
        ));
    }

    #[test]
    fn build_with_key() {
        let config = AppConfig {
            api_key: Some("sk-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "openrouter");
    }

    #[test]
    fn local_endpoint_needs_no_key() {
        let config = AppConfig {
            provider_url: "http://localhost:11434/v1".into(),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
    }
}
