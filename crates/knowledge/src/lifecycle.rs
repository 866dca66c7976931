//! Pipeline lifecycle.
//!
//! The pipeline starts `Uninitialized`. The first query (or an explicit
//! [`Lifecycle::initialize`]) loads the corpus, builds the index and
//! constructs both providers. Success moves it to `Ready`; any failure moves
//! it to `Failed` and the next query tries again. Credentials are resolved on
//! every attempt, so fixing an environment variable is enough to recover.
//!
//! Initialization is single-flight: attempts are serialized by an async
//! mutex and a caller that waited for someone else's attempt returns that
//! attempt's outcome instead of starting another one. Once `Ready`, queries
//! share an `Arc<Pipeline>` and run concurrently without holding any lock.

use crate::chunk::{ChunkConfig, ChunkPipeline};
use crate::document::load_corpus;
use crate::embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
use crate::index::{IndexOptions, IndexStats, SimilarityMetric, VectorIndex};
use crate::rag::{Answer, QueryResponse, Synthesizer};
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use inquiry_core::redact::sanitize_detail;
use inquiry_core::{AppConfig, AppError, AppResult};
use inquiry_llm::{create_client, ClientSettings, LlmClient};
use inquiry_prompt::GroundingTemplate;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Builds the two providers for an initialization attempt.
pub trait ProviderFactory: Send + Sync {
    /// Fail with `AppError::Config` when a required credential is missing.
    fn check_credentials(&self) -> AppResult<()>;

    fn embedding_provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>>;

    fn llm_client(&self) -> AppResult<Arc<dyn LlmClient>>;
}

/// Provider factory backed by application configuration and the process
/// environment.
#[derive(Debug, Clone)]
pub struct ConfigProviderFactory {
    config: AppConfig,
}

impl ConfigProviderFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    fn client_settings(&self) -> AppResult<ClientSettings> {
        let provider = self.config.provider.as_str();
        let provider_config = self.config.provider_config(provider);

        let model = provider_config
            .map(|p| p.model().to_string())
            .unwrap_or_else(|| provider.to_string());
        let mut settings =
            ClientSettings::new(model).with_timeout(self.config.provider_timeout(provider));

        if let Some(endpoint) = provider_config.and_then(|p| p.endpoint()) {
            settings = settings.with_endpoint(endpoint);
        }
        if let Some(key) = self.config.resolve_api_key(provider)? {
            settings = settings.with_api_key(key);
        }
        Ok(settings)
    }
}

impl ProviderFactory for ConfigProviderFactory {
    fn check_credentials(&self) -> AppResult<()> {
        self.config.resolve_api_key(&self.config.provider)?;
        self.config.resolve_api_key(&self.config.embedding_provider)?;
        Ok(())
    }

    fn embedding_provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        create_provider(&EmbeddingConfig::from_app_config(&self.config)?)
    }

    fn llm_client(&self) -> AppResult<Arc<dyn LlmClient>> {
        create_client(&self.config.provider, &self.client_settings()?)
    }
}

/// Static pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// Corpus file or directory
    pub corpus: PathBuf,

    pub chunking: ChunkConfig,

    /// Chunks retrieved per question
    pub top_k: usize,

    pub metric: SimilarityMetric,

    /// Texts per embedding request during index build
    pub batch_size: usize,

    /// Upper bound for one embedding call
    pub embedding_timeout: Duration,

    /// Upper bound for one generation call
    pub llm_timeout: Duration,

    pub template: GroundingTemplate,
}

impl PipelineSettings {
    pub fn new(corpus: impl Into<PathBuf>) -> Self {
        Self {
            corpus: corpus.into(),
            chunking: ChunkConfig::default(),
            top_k: DEFAULT_TOP_K,
            metric: SimilarityMetric::default(),
            batch_size: crate::index::DEFAULT_BATCH_SIZE,
            embedding_timeout: Duration::from_secs(30),
            llm_timeout: Duration::from_secs(30),
            template: GroundingTemplate::default(),
        }
    }

    pub fn from_app_config(config: &AppConfig) -> AppResult<Self> {
        Ok(Self {
            corpus: config.corpus.clone(),
            chunking: ChunkConfig::from(&config.chunking),
            top_k: config.retrieval.top_k,
            metric: config.retrieval.metric.parse()?,
            batch_size: config.retrieval.batch_size,
            embedding_timeout: config.provider_timeout(&config.embedding_provider),
            llm_timeout: config.provider_timeout(&config.provider),
            template: GroundingTemplate::default(),
        })
    }

    fn index_options(&self) -> IndexOptions {
        IndexOptions {
            metric: self.metric,
            batch_size: self.batch_size,
            timeout: Some(self.embedding_timeout),
        }
    }
}

/// Statistics of a ready pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineStats {
    pub documents: usize,
    pub index: IndexStats,
    pub llm_provider: String,
    pub llm_model: String,
    pub top_k: usize,
}

/// A fully built pipeline: retriever plus synthesizer over one index.
pub struct Pipeline {
    retriever: Retriever,
    synthesizer: Synthesizer,
    stats: PipelineStats,
}

impl Pipeline {
    pub fn is_empty(&self) -> bool {
        self.retriever.index().is_empty()
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Retrieve, then synthesize.
    pub async fn answer(&self, query: &str) -> AppResult<Answer> {
        let retrieved = self.retriever.retrieve(query).await?;
        self.synthesizer.synthesize(query, &retrieved).await
    }
}

enum PipelineState {
    Uninitialized,
    Ready(Arc<Pipeline>),
    Failed { reason: String },
}

/// Snapshot of the lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum PipelineStatus {
    Uninitialized,
    Ready { chunks: usize },
    Failed { reason: String },
}

impl PipelineStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Ready { .. } => "ready",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Owns the pipeline state machine.
pub struct Lifecycle {
    settings: PipelineSettings,
    factory: Arc<dyn ProviderFactory>,
    state: RwLock<PipelineState>,
    init_guard: tokio::sync::Mutex<()>,
    attempts: AtomicU64,
}

impl Lifecycle {
    pub fn new(settings: PipelineSettings, factory: Arc<dyn ProviderFactory>) -> Self {
        Self {
            settings,
            factory,
            state: RwLock::new(PipelineState::Uninitialized),
            init_guard: tokio::sync::Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    /// Lifecycle driven by application configuration.
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let settings = PipelineSettings::from_app_config(config)?;
        Ok(Self::new(
            settings,
            Arc::new(ConfigProviderFactory::new(config.clone())),
        ))
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Number of initialization attempts completed so far.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn status(&self) -> PipelineStatus {
        match &*self.read_state() {
            PipelineState::Uninitialized => PipelineStatus::Uninitialized,
            PipelineState::Ready(pipeline) => PipelineStatus::Ready {
                chunks: pipeline.stats.index.chunks,
            },
            PipelineState::Failed { reason } => PipelineStatus::Failed {
                reason: reason.clone(),
            },
        }
    }

    /// Pipeline statistics, when ready.
    pub fn stats(&self) -> Option<PipelineStats> {
        self.ready_pipeline().map(|p| p.stats.clone())
    }

    /// Bring the pipeline up if it is not already ready.
    ///
    /// Never fails: the outcome is reported through the returned status.
    pub async fn initialize(&self) -> PipelineStatus {
        let observed = self.attempts();
        let _guard = self.init_guard.lock().await;

        if self.attempts() != observed || self.ready_pipeline().is_some() {
            return self.status();
        }

        let attempt = observed + 1;
        let started = Instant::now();
        tracing::info!(attempt, corpus = %self.settings.corpus.display(), "Initializing pipeline");

        let next = match self.build().await {
            Ok(pipeline) => {
                tracing::info!(
                    attempt,
                    documents = pipeline.stats.documents,
                    chunks = pipeline.stats.index.chunks,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Pipeline ready"
                );
                PipelineState::Ready(Arc::new(pipeline))
            }
            Err(e) => {
                let reason = sanitize_detail(&e.to_string());
                tracing::warn!(attempt, kind = e.kind(), %reason, "Pipeline initialization failed");
                PipelineState::Failed { reason }
            }
        };

        *self.write_state() = next;
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.status()
    }

    /// Answer a question.
    ///
    /// Initializes on demand. Degraded outcomes (not initialized, empty
    /// knowledge base, failed query) come back as responses, not errors.
    pub async fn query(&self, text: &str) -> QueryResponse {
        let pipeline = match self.ready_pipeline() {
            Some(pipeline) => pipeline,
            None => {
                self.initialize().await;
                match self.ready_pipeline() {
                    Some(pipeline) => pipeline,
                    None => return QueryResponse::not_initialized(),
                }
            }
        };

        if pipeline.is_empty() {
            tracing::info!("Knowledge base is empty, skipping generation");
            return QueryResponse::no_context();
        }

        match pipeline.answer(text).await {
            Ok(answer) => {
                tracing::debug!(citations = answer.citations.len(), "Query answered");
                QueryResponse::answered(answer)
            }
            Err(e) => {
                tracing::warn!(kind = e.kind(), error = %e, "Query failed");
                QueryResponse::error(&sanitize_detail(&e.to_string()))
            }
        }
    }

    async fn build(&self) -> AppResult<Pipeline> {
        self.factory.check_credentials()?;

        let corpus = &self.settings.corpus;
        if !corpus.exists() {
            return Err(AppError::Config(format!(
                "Knowledge base not found at {}",
                corpus.display()
            )));
        }

        let documents = load_corpus(corpus).map_err(initialization)?;
        let chunks = ChunkPipeline::new(self.settings.chunking.clone())
            .map_err(initialization)?
            .split_corpus(&documents);
        tracing::info!(
            "Loaded {} document(s) and split into {} chunks",
            documents.len(),
            chunks.len()
        );

        let embedder = self.factory.embedding_provider().map_err(initialization)?;
        let llm = self.factory.llm_client().map_err(initialization)?;

        let index =
            VectorIndex::build(chunks, embedder.as_ref(), &self.settings.index_options()).await?;

        let retriever = Retriever::new(Arc::new(index), embedder)
            .with_top_k(self.settings.top_k)
            .with_timeout(self.settings.embedding_timeout);
        let stats = PipelineStats {
            documents: documents.len(),
            index: retriever.index().stats(),
            llm_provider: llm.provider_name().to_string(),
            llm_model: llm.model_name().to_string(),
            top_k: retriever.top_k(),
        };
        let synthesizer = Synthesizer::new(llm)
            .with_template(self.settings.template.clone())
            .with_timeout(self.settings.llm_timeout);

        Ok(Pipeline {
            retriever,
            synthesizer,
            stats,
        })
    }

    fn ready_pipeline(&self) -> Option<Arc<Pipeline>> {
        match &*self.read_state() {
            PipelineState::Ready(pipeline) => Some(Arc::clone(pipeline)),
            _ => None,
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, PipelineState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, PipelineState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn initialization(e: AppError) -> AppError {
    match e {
        AppError::Initialization(_) => e,
        other => AppError::Initialization(other.to_string()),
    }
}
