//! Grounded question answering over a fixed corpus.
//!
//! The corpus is loaded once, cut into overlapping chunks, embedded and held
//! in an in-memory vector index. Each question is embedded, the closest
//! chunks are retrieved and a generative model answers from those chunks
//! alone, citing them. [`Lifecycle`] owns the whole pipeline and refuses to
//! answer while the knowledge base or the providers are unavailable.
//!
//! # Example
//! ```no_run
//! use inquiry_core::AppConfig;
//! use inquiry_knowledge::Lifecycle;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let lifecycle = Lifecycle::from_config(&AppConfig::load()?)?;
//! let response = lifecycle.query("What is the duty-free allowance?").await;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod document;
pub mod embeddings;
pub mod index;
pub mod lifecycle;
pub mod rag;
pub mod retriever;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use chunk::{Chunk, ChunkConfig, ChunkPipeline};
pub use document::{load_corpus, Document};
pub use embeddings::{create_provider, EmbeddingConfig, EmbeddingProvider};
pub use index::{IndexOptions, IndexStats, ScoredChunk, SimilarityMetric, VectorIndex};
pub use lifecycle::{
    ConfigProviderFactory, Lifecycle, Pipeline, PipelineSettings, PipelineStats, PipelineStatus,
    ProviderFactory,
};
pub use rag::{Answer, Citation, QueryResponse, QueryStatus, Synthesizer};
pub use retriever::{Retriever, DEFAULT_TOP_K};
