//! Recursive character chunking.
//!
//! Documents are cut into overlapping chunks sized for embedding and for the
//! generative model's context window. Splits prefer paragraph breaks, then
//! line breaks, sentence ends, word boundaries and finally grapheme
//! boundaries. Separators stay attached to the text they end, so the chunks'
//! non-overlapping parts concatenate back to the original document.

mod metadata;
mod pipeline;
mod splitter;

pub use metadata::calculate_hash;
pub use pipeline::{ChunkConfig, ChunkPipeline};
pub use splitter::DEFAULT_SEPARATORS;

use serde::{Deserialize, Serialize};

/// A contiguous, immutable slice of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Source document identifier
    pub source_id: String,

    /// Ordinal across the whole corpus (0-indexed, dense)
    pub position: usize,

    /// Chunk text, leading overlap included
    pub text: String,

    /// Byte range in the source document
    pub byte_range: (usize, usize),

    /// Bytes at the start of `text` repeated from the previous chunk
    pub overlap_len: usize,

    /// Character count of `text`
    pub char_count: usize,

    /// SHA-256 hash of `text`
    pub hash: String,
}

impl Chunk {
    pub(crate) fn new(
        source_id: &str,
        position: usize,
        text: &str,
        byte_range: (usize, usize),
        overlap_len: usize,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            position,
            text: text.to_string(),
            byte_range,
            overlap_len,
            char_count: text.chars().count(),
            hash: calculate_hash(text),
        }
    }

    /// Leading text shared with the previous chunk.
    pub fn overlap_text(&self) -> &str {
        &self.text[..self.overlap_len]
    }

    /// Text this chunk contributes on its own.
    pub fn non_overlap_text(&self) -> &str {
        &self.text[self.overlap_len..]
    }
}
