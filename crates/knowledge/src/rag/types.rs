//! RAG response types.

use serde::{Deserialize, Serialize};

/// Longest citation preview, in characters.
pub const MAX_PREVIEW_CHARS: usize = 200;

/// Answer text when the pipeline could not be brought up.
pub const NOT_INITIALIZED_ANSWER: &str =
    "System not initialized. Please verify the provider credentials and the knowledge base.";

/// Answer text when the knowledge base holds no chunks.
pub const NO_CONTEXT_ANSWER: &str =
    "No relevant context was found in the knowledge base for this question.";

/// Prefix of the answer text for a failed query.
pub const ERROR_ANSWER_PREFIX: &str = "An error occurred while processing the query. Details:";

/// A passage that was supplied to the generative model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    /// First non-empty line of the chunk, trimmed and capped
    pub source_text_preview: String,

    /// Source document identifier
    pub source: String,

    /// Chunk ordinal
    pub position: usize,
}

impl Citation {
    pub fn from_chunk(chunk: &crate::chunk::Chunk) -> Self {
        Self {
            source_text_preview: preview(&chunk.text),
            source: chunk.source_id.clone(),
            position: chunk.position,
        }
    }
}

/// First non-empty line of `text`, trimmed, at most [`MAX_PREVIEW_CHARS`].
pub fn preview(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.chars().take(MAX_PREVIEW_CHARS).collect())
        .unwrap_or_default()
}

/// Generated answer with the passages it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// One per retrieved chunk, in retrieval order
    pub citations: Vec<Citation>,
}

/// How a query was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStatus {
    Answered,
    NoContext,
    NotInitialized,
    Error,
}

/// Result of a query at the core boundary. Degraded outcomes are values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,

    #[serde(rename = "sources")]
    pub citations: Vec<Citation>,

    pub status: QueryStatus,
}

impl QueryResponse {
    pub fn answered(answer: Answer) -> Self {
        Self {
            answer: answer.text,
            citations: answer.citations,
            status: QueryStatus::Answered,
        }
    }

    pub fn not_initialized() -> Self {
        Self {
            answer: NOT_INITIALIZED_ANSWER.to_string(),
            citations: Vec::new(),
            status: QueryStatus::NotInitialized,
        }
    }

    pub fn no_context() -> Self {
        Self {
            answer: NO_CONTEXT_ANSWER.to_string(),
            citations: Vec::new(),
            status: QueryStatus::NoContext,
        }
    }

    /// Failed query; `detail` should already be sanitized.
    pub fn error(detail: &str) -> Self {
        Self {
            answer: format!("{} {}", ERROR_ANSWER_PREFIX, detail),
            citations: Vec::new(),
            status: QueryStatus::Error,
        }
    }
}
