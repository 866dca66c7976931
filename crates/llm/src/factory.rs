//! LLM provider factory.
//!
//! Builds a generative model client from a provider name and resolved
//! settings. Secrets are resolved by the caller so this module never touches
//! the environment.

use crate::client::LlmClient;
use crate::providers::{MockLlmClient, OllamaClient, OpenAiClient};
use crate::types::{ClientSettings, ProviderType};
use inquiry_core::{AppError, AppResult};
use std::sync::Arc;

/// Create an LLM client based on the provider name.
///
/// # Errors
/// Returns `AppError::Config` if:
/// - Provider is unknown
/// - A required API key is missing
///
/// Returns `AppError::Provider` if the HTTP client cannot be constructed.
pub fn create_client(provider: &str, settings: &ClientSettings) -> AppResult<Arc<dyn LlmClient>> {
    let provider_type = ProviderType::parse(provider)
        .ok_or_else(|| AppError::Config(format!("Unknown provider: {}", provider)))?;

    tracing::debug!(
        "Creating LLM client: provider={}, model={}",
        provider_type.as_str(),
        settings.model
    );

    let api_key = settings.api_key.as_deref().filter(|key| !key.is_empty());
    if provider_type.requires_api_key() && api_key.is_none() {
        return Err(AppError::Config(format!(
            "Provider '{}' requires API key",
            provider_type.as_str()
        )));
    }

    match provider_type {
        ProviderType::OpenAI => {
            let client = OpenAiClient::new(
                settings.endpoint.as_deref(),
                api_key.unwrap_or_default(),
                &settings.model,
                settings.timeout,
            )?;
            Ok(Arc::new(client))
        }
        ProviderType::Ollama => {
            let client = OllamaClient::new(
                settings.endpoint.as_deref(),
                &settings.model,
                settings.timeout,
            )?;
            Ok(Arc::new(client))
        }
        ProviderType::Mock => Ok(Arc::new(MockLlmClient::echo())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_ollama_client() {
        let client = create_client("ollama", &ClientSettings::new("llama3.2")).unwrap();
        assert_eq!(client.provider_name(), "ollama");
        assert_eq!(client.model_name(), "llama3.2");
    }

    #[test]
    fn test_create_ollama_with_custom_endpoint() {
        let settings = ClientSettings::new("llama3.2").with_endpoint("http://localhost:8080");
        assert!(create_client("ollama", &settings).is_ok());
    }

    #[test]
    fn test_openai_requires_api_key() {
        match create_client("openai", &ClientSettings::new("gpt-4o-mini")) {
            Err(AppError::Config(msg)) => assert!(msg.contains("requires API key")),
            Err(other) => panic!("Unexpected error: {other}"),
            Ok(_) => panic!("Expected error for OpenAI without API key"),
        }
    }

    #[test]
    fn test_openai_rejects_empty_api_key() {
        let settings = ClientSettings::new("gpt-4o-mini").with_api_key("");
        match create_client("openai", &settings) {
            Err(AppError::Config(msg)) => assert!(msg.contains("'openai' requires API key")),
            Err(other) => panic!("Unexpected error: {other}"),
            Ok(_) => panic!("Expected error for OpenAI with an empty API key"),
        }
    }

    #[test]
    fn test_ollama_ignores_missing_api_key() {
        let settings = ClientSettings::new("llama3.2");
        assert!(settings.api_key.is_none());
        assert!(create_client("ollama", &settings).is_ok());
    }

    #[test]
    fn test_openai_with_key() {
        let settings = ClientSettings::new("gpt-4o-mini").with_api_key("sk-test");
        let client = create_client("openai", &settings).unwrap();
        assert_eq!(client.provider_name(), "openai");
    }

    #[test]
    fn test_unknown_provider() {
        match create_client("unknown", &ClientSettings::new("x")) {
            Err(err) => assert!(err.to_string().contains("Unknown provider")),
            Ok(_) => panic!("Expected error for unknown provider"),
        }
    }
}
