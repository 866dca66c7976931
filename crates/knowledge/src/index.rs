//! In-memory vector index.
//!
//! Exact nearest-neighbour search by linear scan. The index is built once
//! from the full chunk set and is read-only afterwards, so it can be shared
//! between concurrent queries behind an `Arc` without locking.

use crate::chunk::Chunk;
use crate::embeddings::EmbeddingProvider;
use chrono::{DateTime, Utc};
use inquiry_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default number of texts sent per embedding request.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Similarity metric fixed per index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    #[default]
    Cosine,
    InnerProduct,
}

impl SimilarityMetric {
    /// Higher is more similar.
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Self::Cosine => cosine_similarity(a, b),
            Self::InnerProduct => a.iter().zip(b).map(|(x, y)| x * y).sum(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::InnerProduct => "inner_product",
        }
    }
}

impl fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimilarityMetric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(Self::Cosine),
            "inner_product" | "dot" => Ok(Self::InnerProduct),
            other => Err(AppError::Config(format!(
                "Unknown similarity metric: {}. Supported: cosine, inner_product",
                other
            ))),
        }
    }
}

/// Calculate cosine similarity. Zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }
    dot / denom
}

/// A chunk with its similarity to a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Options for building an index.
#[derive(Debug, Clone)]
pub struct IndexOptions {
    pub metric: SimilarityMetric,

    /// Texts per embedding request
    pub batch_size: usize,

    /// Upper bound for each embedding request
    pub timeout: Option<Duration>,
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            metric: SimilarityMetric::Cosine,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout: None,
        }
    }
}

/// Index statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexStats {
    pub chunks: usize,
    pub sources: usize,
    pub dimensions: usize,
    pub metric: SimilarityMetric,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub built_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// Read-only collection of chunk embeddings.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    metric: SimilarityMetric,
    embedding_provider: String,
    embedding_model: String,
    built_at: DateTime<Utc>,
}

impl VectorIndex {
    /// Embed every chunk and build the index.
    ///
    /// Chunks are embedded in batches of `options.batch_size`. A failed or
    /// timed-out batch, a response with the wrong number of vectors or a
    /// vector of the wrong dimension aborts the build; no partial index is
    /// ever returned.
    ///
    /// # Errors
    /// `AppError::Initialization` for every failure listed above and for
    /// duplicate chunk ordinals.
    pub async fn build(
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        options: &IndexOptions,
    ) -> AppResult<Self> {
        let mut seen = HashSet::with_capacity(chunks.len());
        if let Some(dup) = chunks.iter().find(|c| !seen.insert(c.position)) {
            return Err(AppError::Initialization(format!(
                "Duplicate chunk ordinal {} from {}",
                dup.position, dup.source_id
            )));
        }

        let batch_size = options.batch_size.max(1);
        let batch_count = chunks.len().div_ceil(batch_size);
        let mut expected_dims = provider.dimensions();
        let mut embeddings: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());

        for (batch_no, batch) in chunks.chunks(batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
            let vectors = embed_with_timeout(provider, &texts, options.timeout)
                .await
                .map_err(|e| {
                    AppError::Initialization(format!(
                        "Embedding batch {}/{} failed: {}",
                        batch_no + 1,
                        batch_count,
                        e
                    ))
                })?;

            if vectors.len() != texts.len() {
                return Err(AppError::Initialization(format!(
                    "Embedding batch {}/{} returned {} vectors for {} chunks",
                    batch_no + 1,
                    batch_count,
                    vectors.len(),
                    texts.len()
                )));
            }

            for vector in &vectors {
                let dims = *expected_dims.get_or_insert(vector.len());
                if vector.len() != dims || dims == 0 {
                    return Err(AppError::Initialization(format!(
                        "Embedding dimension mismatch: got {}, expected {}",
                        vector.len(),
                        dims
                    )));
                }
            }

            tracing::debug!(
                "Embedded batch {}/{} ({} chunks)",
                batch_no + 1,
                batch_count,
                vectors.len()
            );
            embeddings.extend(vectors);
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect();

        Ok(Self {
            entries,
            dimensions: expected_dims.unwrap_or(0),
            metric: options.metric,
            embedding_provider: provider.provider_name().to_string(),
            embedding_model: provider.model_name().to_string(),
            built_at: Utc::now(),
        })
    }

    /// The `k` entries most similar to `query`, best first.
    ///
    /// Equal scores are ordered by ascending chunk ordinal.
    ///
    /// # Errors
    /// `AppError::Retrieval` when the query dimension differs from the index.
    pub fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<ScoredChunk>> {
        if !self.entries.is_empty() && query.len() != self.dimensions {
            return Err(AppError::Retrieval(format!(
                "Query embedding has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.score(query, &entry.embedding)))
            .collect();

        scored.sort_by(|(ia, sa), (ib, sb)| {
            sb.total_cmp(sa).then_with(|| {
                self.entries[*ia]
                    .chunk
                    .position
                    .cmp(&self.entries[*ib].chunk.position)
            })
        });
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn metric(&self) -> SimilarityMetric {
        self.metric
    }

    /// Indexed chunks in ordinal order of insertion.
    pub fn chunks(&self) -> impl Iterator<Item = &Chunk> {
        self.entries.iter().map(|e| &e.chunk)
    }

    pub fn stats(&self) -> IndexStats {
        let sources: HashSet<&str> = self.chunks().map(|c| c.source_id.as_str()).collect();
        IndexStats {
            chunks: self.entries.len(),
            sources: sources.len(),
            dimensions: self.dimensions,
            metric: self.metric,
            embedding_provider: self.embedding_provider.clone(),
            embedding_model: self.embedding_model.clone(),
            built_at: self.built_at,
        }
    }
}

async fn embed_with_timeout(
    provider: &dyn EmbeddingProvider,
    texts: &[String],
    timeout: Option<Duration>,
) -> AppResult<Vec<Vec<f32>>> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, provider.embed_batch(texts))
            .await
            .map_err(|_| {
                AppError::Provider(format!(
                    "{} embedding request timed out after {}s",
                    provider.provider_name(),
                    limit.as_secs_f64()
                ))
            })?,
        None => provider.embed_batch(texts).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn chunk(position: usize, text: &str) -> Chunk {
        Chunk::new("kb.txt", position, text, (0, text.len()), 0)
    }

    /// Returns fixed vectors keyed by text, and can fail on a given call.
    #[derive(Debug, Default)]
    struct TableProvider {
        table: Vec<(&'static str, Vec<f32>)>,
        fail_on_call: Option<usize>,
        short_batch: bool,
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl EmbeddingProvider for TableProvider {
        fn provider_name(&self) -> &str {
            "table"
        }

        fn model_name(&self) -> &str {
            "table"
        }

        fn dimensions(&self) -> Option<usize> {
            None
        }

        async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(call) {
                return Err(AppError::Provider("quota exceeded".to_string()));
            }
            let mut out: Vec<Vec<f32>> = texts
                .iter()
                .map(|t| {
                    self.table
                        .iter()
                        .find(|(k, _)| k == t)
                        .map(|(_, v)| v.clone())
                        .unwrap_or_else(|| vec![0.0, 0.0])
                })
                .collect();
            if self.short_batch {
                out.pop();
            }
            Ok(out)
        }
    }

    fn table() -> TableProvider {
        TableProvider {
            table: vec![
                ("north", vec![1.0, 0.0]),
                ("east", vec![0.0, 1.0]),
                ("northeast", vec![0.7, 0.7]),
                ("north again", vec![1.0, 0.0]),
                ("long north", vec![3.0, 0.0]),
                ("odd", vec![1.0, 0.0, 0.0]),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_metric_parsing() {
        assert_eq!("cosine".parse::<SimilarityMetric>().unwrap(), SimilarityMetric::Cosine);
        assert_eq!(
            "inner_product".parse::<SimilarityMetric>().unwrap(),
            SimilarityMetric::InnerProduct
        );
        assert_eq!("dot".parse::<SimilarityMetric>().unwrap(), SimilarityMetric::InnerProduct);
        assert!("euclid".parse::<SimilarityMetric>().is_err());
    }

    #[tokio::test]
    async fn test_search_orders_by_score() {
        let provider = table();
        let chunks = vec![chunk(0, "east"), chunk(1, "northeast"), chunk(2, "north")];
        let index = VectorIndex::build(chunks, &provider, &IndexOptions::default())
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 3).unwrap();
        let order: Vec<_> = results.iter().map(|r| r.chunk.position).collect();
        assert_eq!(order, vec![2, 1, 0]);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[tokio::test]
    async fn test_ties_break_by_ordinal() {
        let provider = table();
        let chunks = vec![chunk(0, "east"), chunk(1, "north again"), chunk(2, "north")];
        let index = VectorIndex::build(chunks, &provider, &IndexOptions::default())
            .await
            .unwrap();

        let results = index.search(&[1.0, 0.0], 2).unwrap();
        let order: Vec<_> = results.iter().map(|r| r.chunk.position).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_returns_at_most_k() {
        let provider = table();
        let chunks = vec![chunk(0, "east"), chunk(1, "north")];
        let index = VectorIndex::build(chunks, &provider, &IndexOptions::default())
            .await
            .unwrap();

        assert_eq!(index.search(&[1.0, 0.0], 5).unwrap().len(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 1).unwrap().len(), 1);
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inner_product_rewards_magnitude() {
        let provider = table();
        let chunks = vec![chunk(0, "north"), chunk(1, "long north")];
        let options = IndexOptions {
            metric: SimilarityMetric::InnerProduct,
            ..Default::default()
        };
        let index = VectorIndex::build(chunks.clone(), &provider, &options)
            .await
            .unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 1).unwrap()[0].chunk.position, 1);

        let cosine = VectorIndex::build(chunks, &provider, &IndexOptions::default())
            .await
            .unwrap();
        assert_eq!(cosine.search(&[1.0, 0.0], 1).unwrap()[0].chunk.position, 0);
    }

    #[tokio::test]
    async fn test_query_dimension_mismatch() {
        let provider = table();
        let index = VectorIndex::build(vec![chunk(0, "north")], &provider, &IndexOptions::default())
            .await
            .unwrap();
        let err = index.search(&[1.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, AppError::Retrieval(_)));
    }

    #[tokio::test]
    async fn test_batch_failure_aborts_build() {
        let provider = TableProvider {
            fail_on_call: Some(1),
            ..table()
        };
        let chunks = vec![chunk(0, "north"), chunk(1, "east"), chunk(2, "northeast")];
        let options = IndexOptions {
            batch_size: 2,
            ..Default::default()
        };

        let err = VectorIndex::build(chunks, &provider, &options).await.unwrap_err();
        match err {
            AppError::Initialization(msg) => {
                assert!(msg.contains("batch 2/2"));
                assert!(msg.contains("quota exceeded"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_count_mismatch_aborts_build() {
        let provider = TableProvider {
            short_batch: true,
            ..table()
        };
        let result =
            VectorIndex::build(vec![chunk(0, "north"), chunk(1, "east")], &provider, &IndexOptions::default())
                .await;
        assert!(matches!(result, Err(AppError::Initialization(_))));
    }

    #[tokio::test]
    async fn test_dimension_mismatch_aborts_build() {
        let provider = table();
        let result =
            VectorIndex::build(vec![chunk(0, "north"), chunk(1, "odd")], &provider, &IndexOptions::default())
                .await;
        match result {
            Err(AppError::Initialization(msg)) => assert!(msg.contains("dimension mismatch")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_duplicate_ordinals_rejected() {
        let provider = table();
        let result =
            VectorIndex::build(vec![chunk(0, "north"), chunk(0, "east")], &provider, &IndexOptions::default())
                .await;
        assert!(matches!(result, Err(AppError::Initialization(_))));
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_batching_with_mock_provider() {
        let provider = MockProvider::new(64);
        let chunks: Vec<_> = (0..250).map(|i| chunk(i, &format!("entry number {i}"))).collect();
        let options = IndexOptions {
            batch_size: 100,
            ..Default::default()
        };
        let index = VectorIndex::build(chunks, &provider, &options).await.unwrap();

        let stats = index.stats();
        assert_eq!(stats.chunks, 250);
        assert_eq!(stats.sources, 1);
        assert_eq!(stats.dimensions, 64);
        assert_eq!(stats.embedding_provider, "mock");
    }

    #[tokio::test]
    async fn test_empty_index() {
        let provider = MockProvider::new(32);
        let index = VectorIndex::build(Vec::new(), &provider, &IndexOptions::default())
            .await
            .unwrap();
        assert!(index.is_empty());
        assert_eq!(index.dimensions(), 32);
        assert!(index.search(&[0.0; 8], 3).unwrap().is_empty());
    }
}
