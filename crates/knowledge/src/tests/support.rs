//! Test doubles shared by the scenario tests.

use crate::embeddings::{EmbeddingProvider, MockProvider};
use crate::lifecycle::{Lifecycle, PipelineSettings, ProviderFactory};
use inquiry_core::{AppError, AppResult};
use inquiry_llm::{LlmClient, MockLlmClient};
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Mock embeddings with an optional delay and failure switch.
#[derive(Debug)]
pub struct ScriptedEmbedder {
    inner: MockProvider,
    delay: Option<Duration>,
    fail: AtomicBool,
    pub batches: AtomicUsize,
}

impl ScriptedEmbedder {
    pub fn new() -> Self {
        Self {
            inner: MockProvider::new(128),
            delay: None,
            fail: AtomicBool::new(false),
            batches: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing(self) -> Self {
        self.fail.store(true, Ordering::SeqCst);
        self
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for ScriptedEmbedder {
    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        self.inner.model_name()
    }

    fn dimensions(&self) -> Option<usize> {
        self.inner.dimensions()
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Provider("embedding service unavailable".to_string()));
        }
        self.inner.embed_batch(texts).await
    }
}

/// Factory whose credential can be switched on and off.
pub struct TestFactory {
    pub credentials: AtomicBool,
    pub embedder: Arc<ScriptedEmbedder>,
    pub llm: Arc<MockLlmClient>,
    pub builds: AtomicUsize,
}

impl TestFactory {
    pub fn new(embedder: ScriptedEmbedder, llm: MockLlmClient) -> Arc<Self> {
        Arc::new(Self {
            credentials: AtomicBool::new(true),
            embedder: Arc::new(embedder),
            llm: Arc::new(llm),
            builds: AtomicUsize::new(0),
        })
    }

    pub fn echo() -> Arc<Self> {
        Self::new(ScriptedEmbedder::new(), MockLlmClient::echo())
    }
}

impl ProviderFactory for TestFactory {
    fn check_credentials(&self) -> AppResult<()> {
        if self.credentials.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Config(
                "API key for provider 'openai' not found in environment variable OPENAI_API_KEY"
                    .to_string(),
            ))
        }
    }

    fn embedding_provider(&self) -> AppResult<Arc<dyn EmbeddingProvider>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        Ok(self.embedder.clone())
    }

    fn llm_client(&self) -> AppResult<Arc<dyn LlmClient>> {
        Ok(self.llm.clone())
    }
}

pub fn lifecycle(corpus: &Path, factory: Arc<TestFactory>) -> Lifecycle {
    Lifecycle::new(PipelineSettings::new(corpus), factory)
}
