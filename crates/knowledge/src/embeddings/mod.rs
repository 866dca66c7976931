//! Embedding providers.
//!
//! Text goes in, fixed-length vectors come out. The active provider is
//! chosen by name from configuration.

pub mod config;
pub mod provider;
pub mod providers;

pub use config::{known_dimensions, EmbeddingConfig, MOCK_DIMENSIONS};
pub use provider::{create_provider, EmbeddingProvider};
pub use providers::{MockProvider, OllamaProvider, OpenAiProvider};
