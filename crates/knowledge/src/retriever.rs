//! Query-time retrieval.

use crate::embeddings::EmbeddingProvider;
use crate::index::{ScoredChunk, VectorIndex};
use inquiry_core::{AppError, AppResult};
use std::sync::Arc;
use std::time::Duration;

/// Number of chunks handed to the generative model per question.
pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a question and looks up the closest chunks.
#[derive(Debug, Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    top_k: usize,
    timeout: Option<Duration>,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            index,
            provider,
            top_k: DEFAULT_TOP_K,
            timeout: None,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    /// Bound the query embedding call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// Retrieve the `top_k` chunks most similar to `query`, best first.
    ///
    /// # Errors
    /// `AppError::Retrieval` when the query is blank, the index is empty, or
    /// the embedding call fails or times out.
    pub async fn retrieve(&self, query: &str) -> AppResult<Vec<ScoredChunk>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::Retrieval("Query is empty".to_string()));
        }
        if self.index.is_empty() {
            return Err(AppError::Retrieval(
                "Knowledge base index is empty".to_string(),
            ));
        }

        let embedding = self.embed_query(query).await?;
        let results = self.index.search(&embedding, self.top_k)?;

        tracing::debug!(
            results = results.len(),
            top_score = results.first().map(|r| r.score).unwrap_or(0.0),
            "Retrieved chunks"
        );

        Ok(results)
    }

    async fn embed_query(&self, query: &str) -> AppResult<Vec<f32>> {
        let call = self.provider.embed(query);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                AppError::Retrieval(format!(
                    "Query embedding timed out after {}s",
                    limit.as_secs_f64()
                ))
            })?,
            None => call.await,
        };

        result.map_err(|e| AppError::Retrieval(format!("Failed to embed query: {}", e)))
    }
}
