//! Answer synthesis from retrieved chunks.

use crate::index::ScoredChunk;
use crate::rag::types::{Answer, Citation};
use inquiry_core::{AppError, AppResult};
use inquiry_llm::{ChatMessage, LlmClient, LlmRequest};
use inquiry_prompt::{build_grounding_prompt, GroundingTemplate};
use std::sync::Arc;
use std::time::Duration;

/// Sampling temperature for grounded answers.
pub const ANSWER_TEMPERATURE: f32 = 0.0;

/// Turns a question plus retrieved chunks into a cited answer.
#[derive(Clone)]
pub struct Synthesizer {
    llm: Arc<dyn LlmClient>,
    template: GroundingTemplate,
    timeout: Option<Duration>,
}

impl Synthesizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            template: GroundingTemplate::default(),
            timeout: None,
        }
    }

    pub fn with_template(mut self, template: GroundingTemplate) -> Self {
        self.template = template;
        self
    }

    /// Bound the generation call.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Generate an answer grounded in `retrieved`.
    ///
    /// The model is called exactly once. Citations follow retrieval order,
    /// one per chunk placed in the prompt.
    ///
    /// # Errors
    /// `AppError::Generation` when the prompt cannot be rendered, the model
    /// call fails or times out, or the model returns no text.
    pub async fn synthesize(&self, query: &str, retrieved: &[ScoredChunk]) -> AppResult<Answer> {
        let contexts: Vec<&str> = retrieved.iter().map(|r| r.chunk.text.as_str()).collect();
        let prompt = build_grounding_prompt(&self.template, query, &contexts)
            .map_err(|e| AppError::Generation(format!("Failed to build prompt: {}", e)))?;

        let request = LlmRequest::new(vec![
            ChatMessage::system(prompt.system),
            ChatMessage::user(prompt.user),
        ])
        .with_temperature(ANSWER_TEMPERATURE);

        tracing::debug!(
            provider = self.llm.provider_name(),
            model = self.llm.model_name(),
            passages = contexts.len(),
            "Requesting grounded answer"
        );

        let call = self.llm.complete(&request);
        let response = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.map_err(|_| {
                AppError::Generation(format!(
                    "Answer generation timed out after {}s",
                    limit.as_secs_f64()
                ))
            })?,
            None => call.await,
        }
        .map_err(|e| AppError::Generation(e.to_string()))?;

        let text = response.content.trim();
        if text.is_empty() {
            return Err(AppError::Generation(
                "Could not generate an answer".to_string(),
            ));
        }

        Ok(Answer {
            text: text.to_string(),
            citations: retrieved
                .iter()
                .map(|r| Citation::from_chunk(&r.chunk))
                .collect(),
        })
    }
}
