//! Embedding provider configuration.

use inquiry_core::config::ProviderConfig;
use inquiry_core::AppConfig;
use inquiry_core::AppResult;
use std::time::Duration;

/// Dimensions of the mock provider's vectors.
pub const MOCK_DIMENSIONS: usize = 384;

/// Settings for constructing one embedding provider.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingConfig {
    /// Provider name: "openai", "ollama", "mock"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Custom endpoint; provider default when absent
    pub endpoint: Option<String>,

    /// API key, already resolved from the environment
    pub api_key: Option<String>,

    /// Upper bound for one HTTP call
    pub timeout: Duration,

    /// Expected vector dimensions; looked up from the model name when absent
    pub dimensions: Option<usize>,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "mock".to_string(),
            model: "trigram-v1".to_string(),
            endpoint: None,
            api_key: None,
            timeout: Duration::from_secs(30),
            dimensions: Some(MOCK_DIMENSIONS),
        }
    }
}

impl EmbeddingConfig {
    /// Resolve the active embedding provider from application config.
    ///
    /// Reads the provider's credential from the environment, so a missing
    /// key surfaces here as `AppError::Config`.
    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        let provider = config.embedding_provider.clone();
        if provider == "mock" {
            return Ok(Self::default());
        }

        let api_key = config.resolve_api_key(&provider)?;
        let provider_config = config.provider_config(&provider);
        let model = provider_config
            .and_then(ProviderConfig::embedding_model)
            .map(str::to_string)
            .unwrap_or_else(|| default_model(&provider).to_string());

        Ok(Self {
            dimensions: known_dimensions(&model),
            endpoint: provider_config.and_then(|p| p.endpoint().map(str::to_string)),
            timeout: config.provider_timeout(&provider),
            api_key,
            model,
            provider,
        })
    }
}

fn default_model(provider: &str) -> &'static str {
    match provider {
        "ollama" => "nomic-embed-text",
        _ => "text-embedding-3-small",
    }
}

/// Output dimensions of well-known embedding models.
pub fn known_dimensions(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        "text-embedding-3-large" => Some(3072),
        "nomic-embed-text" => Some(768),
        "mxbai-embed-large" => Some(1024),
        "all-minilm" => Some(384),
        _ => None,
    }
}
