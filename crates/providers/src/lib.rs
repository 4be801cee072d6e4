//! Model API providers for Parley.
//!
//! All providers implement the `parley_core::Provider` trait.
//! [`build_from_config`] turns an [`AppConfig`] into a ready provider and is
//! where a missing credential becomes a startup error.

pub mod openai_compat;

use std::sync::Arc;

use parley_config::{AppConfig, ConfigError};
use parley_core::Provider;

pub use openai_compat::OpenAiCompatProvider;

/// Build the configured provider.
///
/// Fails with [`ConfigError::MissingApiKey`] when no credential is present,
/// so the process refuses to start instead of failing on the first request.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn Provider>, ConfigError> {
    let api_key = config.require_api_key()?;

    let base_url = config
        .provider
        .base_url
        .clone()
        .unwrap_or_else(|| default_base_url(&config.provider.name));

    tracing::info!(
        provider = %config.provider.name,
        model = %config.provider.model,
        base_url = %base_url,
        "Model provider configured"
    );

    Ok(Arc::new(OpenAiCompatProvider::new(
        &config.provider.name,
        base_url,
        api_key,
    )))
}

/// Get the default base URL for well-known providers.
pub fn default_base_url(provider_name: &str) -> String {
    match provider_name {
        "groq" => "https://api.groq.com/openai/v1".into(),
        "openai" => "https://api.openai.com/v1".into(),
        "openrouter" => "https://openrouter.ai/api/v1".into(),
        "together" => "https://api.together.xyz/v1".into(),
        "ollama" => "http://localhost:11434/v1".into(),
        "vllm" => "http://localhost:8000/v1".into(),
        _ => "https://api.groq.com/openai/v1".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_fails_at_build_time() {
        let config = AppConfig::default();
        assert!(matches!(
            build_from_config(&config),
            Err(ConfigError::MissingApiKey { .. })
        ));
    }

    #[test]
    fn build_with_key() {
        let config = AppConfig {
            api_key: Some("gsk-test".into()),
            ..AppConfig::default()
        };
        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.name(), "groq");
    }

    #[test]
    fn default_base_urls() {
        assert!(default_base_url("groq").contains("api.groq.com"));
        assert!(default_base_url("openai").contains("api.openai.com"));
        assert!(default_base_url("ollama").contains("localhost:11434"));
    }
}
