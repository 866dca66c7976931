//! Configuration management for the Inquiry service.
//!
//! Configuration is assembled in layers, later layers winning:
//! - Built-in defaults
//! - YAML config file (`inquiry.yaml` in the working directory, or `--config`)
//! - Environment variables
//! - Command-line flags
//!
//! Provider credentials are never stored in the config itself. Each provider
//! names the environment variable that holds its key, and the key is read
//! every time it is resolved so a corrected credential is picked up without
//! restarting the process.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

/// Default location of the knowledge base, relative to the working directory.
pub const DEFAULT_CORPUS_PATH: &str = "data/customs_knowledge_base.txt";

/// Default config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "inquiry.yaml";

/// Providers the factories know how to build.
pub const KNOWN_PROVIDERS: [&str; 3] = ["openai", "ollama", "mock"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Corpus source: a text file or a directory of text files
    pub corpus: PathBuf,

    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Generative model provider (e.g., "openai", "ollama")
    pub provider: String,

    /// Embedding provider (e.g., "openai", "ollama")
    pub embedding_provider: String,

    /// Chunking settings
    pub chunking: ChunkingConfig,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Per-provider settings
    pub llm: LlmConfig,

    /// HTTP boundary settings
    pub server: ServerConfig,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Chunk sizing, measured in characters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingConfig {
    #[serde(rename = "maxChunkSize", default = "default_max_chunk_size")]
    pub max_chunk_size: usize,

    #[serde(rename = "chunkOverlap", default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

fn default_max_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    150
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: default_max_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

/// Retrieval settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the generative model
    #[serde(rename = "topK", default = "default_top_k")]
    pub top_k: usize,

    /// Similarity metric: "cosine" or "inner_product"
    #[serde(default = "default_metric")]
    pub metric: String,

    /// Texts per embedding request while building the index
    #[serde(rename = "batchSize", default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_top_k() -> usize {
    3
}

fn default_metric() -> String {
    "cosine".to_string()
}

fn default_batch_size() -> usize {
    100
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            metric: default_metric(),
            batch_size: default_batch_size(),
        }
    }
}

/// HTTP boundary settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(rename = "corsOrigins", default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
}

fn default_port() -> u16 {
    8000
}

fn default_cors_origins() -> Vec<String> {
    vec![
        "http://localhost".to_string(),
        "http://localhost:3000".to_string(),
    ]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            cors_origins: default_cors_origins(),
        }
    }
}

/// Provider configuration section of config.yaml.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(rename = "activeProvider")]
    pub active_provider: String,

    #[serde(rename = "activeEmbeddingProvider")]
    pub active_embedding_provider: String,

    #[serde(rename = "timeoutSecs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = HashMap::new();

        providers.insert(
            "openai".to_string(),
            ProviderConfig::OpenAI {
                api_key_env: "OPENAI_API_KEY".to_string(),
                model: "gpt-4o-mini".to_string(),
                embedding_model: Some("text-embedding-3-small".to_string()),
                endpoint: None,
                timeout: None,
            },
        );

        providers.insert(
            "ollama".to_string(),
            ProviderConfig::Ollama {
                endpoint: "http://localhost:11434".to_string(),
                model: "llama3.2".to_string(),
                embedding_model: Some("nomic-embed-text".to_string()),
                timeout: Some(60),
            },
        );

        Self {
            active_provider: "openai".to_string(),
            active_embedding_provider: "openai".to_string(),
            timeout_secs: default_timeout_secs(),
            providers,
        }
    }
}

/// Provider-specific configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProviderConfig {
    OpenAI {
        #[serde(rename = "apiKeyEnv")]
        api_key_env: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        endpoint: Option<String>,
        timeout: Option<u64>,
    },
    Ollama {
        endpoint: String,
        model: String,
        #[serde(rename = "embeddingModel")]
        embedding_model: Option<String>,
        timeout: Option<u64>,
    },
}

impl ProviderConfig {
    /// Generative model identifier.
    pub fn model(&self) -> &str {
        match self {
            Self::OpenAI { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Embedding model identifier, if configured.
    pub fn embedding_model(&self) -> Option<&str> {
        match self {
            Self::OpenAI {
                embedding_model, ..
            }
            | Self::Ollama {
                embedding_model, ..
            } => embedding_model.as_deref(),
        }
    }

    /// Custom endpoint, if configured.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::OpenAI { endpoint, .. } => endpoint.as_deref(),
            Self::Ollama { endpoint, .. } => Some(endpoint),
        }
    }

    /// Per-provider timeout override in seconds.
    pub fn timeout(&self) -> Option<u64> {
        match self {
            Self::OpenAI { timeout, .. } | Self::Ollama { timeout, .. } => *timeout,
        }
    }

    /// Name of the environment variable holding the API key, if one is required.
    pub fn api_key_env(&self) -> Option<&str> {
        match self {
            Self::OpenAI { api_key_env, .. } => Some(api_key_env),
            Self::Ollama { .. } => None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    corpus: Option<CorpusSection>,
    chunking: Option<ChunkingConfig>,
    retrieval: Option<RetrievalConfig>,
    llm: Option<LlmConfig>,
    server: Option<ServerConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CorpusSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let llm = LlmConfig::default();
        Self {
            corpus: PathBuf::from(DEFAULT_CORPUS_PATH),
            config_file: None,
            provider: llm.active_provider.clone(),
            embedding_provider: llm.active_embedding_provider.clone(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            llm,
            server: ServerConfig::default(),
            log_level: None,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the default config file and the environment.
    ///
    /// Environment variables:
    /// - `INQUIRY_CONFIG`: Path to config file
    /// - `INQUIRY_CORPUS`: Corpus file or directory
    /// - `INQUIRY_PROVIDER`: Generative model provider
    /// - `INQUIRY_EMBEDDING_PROVIDER`: Embedding provider
    /// - `SERVER_PORT`: HTTP port
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use inquiry_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Corpus: {:?}", config.corpus);
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_from(None)
    }

    /// Load configuration, merging an explicit config file when given.
    ///
    /// An explicit file must exist; the default `inquiry.yaml` is optional.
    pub fn load_from(config_file: Option<&Path>) -> AppResult<Self> {
        let mut config = Self::default();

        let explicit = config_file
            .map(Path::to_path_buf)
            .or_else(|| std::env::var("INQUIRY_CONFIG").ok().map(PathBuf::from));

        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(AppError::Config(format!(
                        "Config file does not exist: {:?}",
                        path
                    )));
                }
                config = config.merge_yaml(&path)?;
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    config = config.merge_yaml(&default_path)?;
                }
            }
        }

        // Environment variables override YAML config
        if let Ok(corpus) = std::env::var("INQUIRY_CORPUS") {
            config.corpus = PathBuf::from(corpus);
        }

        if let Ok(provider) = std::env::var("INQUIRY_PROVIDER") {
            config.provider = provider;
        }

        if let Ok(provider) = std::env::var("INQUIRY_EMBEDDING_PROVIDER") {
            config.embedding_provider = provider;
        }

        if let Ok(port) = std::env::var("SERVER_PORT") {
            config.server.port = port.parse().map_err(|e| {
                AppError::Config(format!("Invalid SERVER_PORT '{}': {}", port, e))
            })?;
        }

        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into a copy of this config.
    fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();
        result.config_file = Some(path.to_path_buf());

        if let Some(path) = config_file.corpus.and_then(|c| c.path) {
            result.corpus = PathBuf::from(path);
        }

        if let Some(chunking) = config_file.chunking {
            result.chunking = chunking;
        }

        if let Some(retrieval) = config_file.retrieval {
            result.retrieval = retrieval;
        }

        if let Some(server) = config_file.server {
            result.server = server;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        if let Some(mut llm) = config_file.llm {
            result.provider = llm.active_provider.clone();
            result.embedding_provider = llm.active_embedding_provider.clone();

            // Keep built-in provider entries the file does not redefine
            for (name, provider) in &self.llm.providers {
                llm.providers
                    .entry(name.clone())
                    .or_insert_with(|| provider.clone());
            }
            result.llm = llm;
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables.
    pub fn with_overrides(
        mut self,
        corpus: Option<PathBuf>,
        provider: Option<String>,
        embedding_provider: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(corpus) = corpus {
            self.corpus = corpus;
        }

        if let Some(provider) = provider {
            self.provider = provider;
        }

        if let Some(provider) = embedding_provider {
            self.embedding_provider = provider;
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the configuration for a provider.
    pub fn provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.llm.providers.get(provider)
    }

    /// Resolve the API key for a provider from its environment variable.
    ///
    /// Returns `Ok(None)` for providers that need no key and an error when a
    /// required key is absent or empty.
    pub fn resolve_api_key(&self, provider: &str) -> AppResult<Option<String>> {
        let Some(env_var) = self.provider_config(provider).and_then(|p| p.api_key_env()) else {
            return Ok(None);
        };

        match std::env::var(env_var) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
            _ => Err(AppError::Config(format!(
                "API key for provider '{}' not found in environment variable {}",
                provider, env_var
            ))),
        }
    }

    /// Timeout applied to a single call to the given provider.
    pub fn provider_timeout(&self, provider: &str) -> Duration {
        let secs = self
            .provider_config(provider)
            .and_then(ProviderConfig::timeout)
            .unwrap_or(self.llm.timeout_secs);
        Duration::from_secs(secs)
    }

    /// Validate static configuration.
    ///
    /// Credentials and corpus presence are deliberately not checked here: they
    /// are re-checked on every pipeline initialization attempt.
    pub fn validate(&self) -> AppResult<()> {
        for provider in [&self.provider, &self.embedding_provider] {
            if !KNOWN_PROVIDERS.contains(&provider.as_str()) {
                return Err(AppError::Config(format!(
                    "Unknown provider: {}. Supported: {}",
                    provider,
                    KNOWN_PROVIDERS.join(", ")
                )));
            }
        }

        if self.chunking.max_chunk_size == 0 {
            return Err(AppError::Config(
                "chunking.maxChunkSize must be greater than zero".to_string(),
            ));
        }

        if self.chunking.chunk_overlap >= self.chunking.max_chunk_size {
            return Err(AppError::Config(format!(
                "chunking.chunkOverlap ({}) must be smaller than chunking.maxChunkSize ({})",
                self.chunking.chunk_overlap, self.chunking.max_chunk_size
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config(
                "retrieval.topK must be greater than zero".to_string(),
            ));
        }

        if self.retrieval.batch_size == 0 {
            return Err(AppError::Config(
                "retrieval.batchSize must be greater than zero".to_string(),
            ));
        }

        if !matches!(
            self.retrieval.metric.as_str(),
            "cosine" | "inner_product" | "dot"
        ) {
            return Err(AppError::Config(format!(
                "Unknown similarity metric: {}. Supported: cosine, inner_product",
                self.retrieval.metric
            )));
        }

        Ok(())
    }
}
