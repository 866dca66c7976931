//! LLM integration crate for Inquiry.
//!
//! This crate provides a provider-agnostic abstraction for the generative
//! model that turns retrieved context into an answer.
//!
//! # Providers
//! - **OpenAI**: chat completions API (default)
//! - **Ollama**: local LLM runtime
//! - **Mock**: deterministic, offline
//!
//! # Example
//! ```no_run
//! use inquiry_llm::{create_client, ChatMessage, ClientSettings, LlmRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = create_client("ollama", &ClientSettings::new("llama3.2"))?;
//! let request = LlmRequest::new(vec![ChatMessage::user("Hello, world!")]);
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, LlmClient, LlmRequest, LlmResponse, LlmUsage, Role};
pub use factory::create_client;
pub use providers::{MockLlmClient, OllamaClient, OpenAiClient};
pub use types::{ClientSettings, ProviderType};
