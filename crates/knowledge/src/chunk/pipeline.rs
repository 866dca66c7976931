//! Chunking pipeline orchestrator.

use super::splitter::{
    back_chars, boundary_after, boundary_before, char_len, is_unit_boundary, split_units,
    DEFAULT_SEPARATORS,
};
use super::Chunk;
use crate::document::Document;
use inquiry_core::config::ChunkingConfig;
use inquiry_core::{AppError, AppResult};

/// Configuration for chunking pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkConfig {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,

    /// Minimum characters repeated from the previous chunk; the overlap is
    /// widened to start on a separator boundary
    pub chunk_overlap: usize,

    /// Separators in priority order; `""` means grapheme boundary
    pub separators: Vec<String>,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 1000,
            chunk_overlap: 150,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl From<&ChunkingConfig> for ChunkConfig {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            max_chunk_size: config.max_chunk_size,
            chunk_overlap: config.chunk_overlap,
            ..Self::default()
        }
    }
}

impl ChunkConfig {
    pub fn new(max_chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            max_chunk_size,
            chunk_overlap,
            ..Self::default()
        }
    }

    pub fn with_separators<S: Into<String>>(mut self, separators: impl IntoIterator<Item = S>) -> Self {
        self.separators = separators.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.max_chunk_size == 0 {
            return Err(AppError::Config(
                "Chunk size must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.max_chunk_size {
            return Err(AppError::Config(format!(
                "Chunk overlap ({}) must be smaller than chunk size ({})",
                self.chunk_overlap, self.max_chunk_size
            )));
        }
        Ok(())
    }
}

/// Splits documents into overlapping chunks.
#[derive(Debug, Clone)]
pub struct ChunkPipeline {
    config: ChunkConfig,
}

impl ChunkPipeline {
    /// Create a new pipeline, rejecting inconsistent sizes.
    pub fn new(config: ChunkConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Split one document. Ordinals start at zero.
    pub fn split(&self, document: &Document) -> Vec<Chunk> {
        self.split_from(document, 0)
    }

    /// Split every document, numbering chunks densely across the corpus in
    /// document order.
    pub fn split_corpus(&self, documents: &[Document]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        for document in documents {
            let next = self.split_from(document, chunks.len());
            tracing::debug!(
                source = %document.source_id,
                chunks = next.len(),
                "Chunked document"
            );
            chunks.extend(next);
        }
        chunks
    }

    fn split_from(&self, document: &Document, first_position: usize) -> Vec<Chunk> {
        let text = document.text.as_str();
        let max = self.config.max_chunk_size;
        let unit_limit = max.saturating_sub(self.config.chunk_overlap).max(1);

        let mut chunks: Vec<Chunk> = Vec::new();
        let mut offset = 0;
        let mut segment = Segment::default();

        for unit in split_units(text, &self.config.separators, unit_limit) {
            let unit_chars = char_len(unit);
            let budget = max.saturating_sub(segment.overlap_chars);

            if segment.chars > 0 && segment.chars + unit_chars > budget {
                let chunk = self.emit(document, &segment, first_position + chunks.len());
                let floor = chunk.byte_range.0;
                chunks.push(chunk);
                segment = self.next_segment(text, segment.end, floor);
            }

            offset += unit.len();
            segment.end = offset;
            segment.chars += unit_chars;
        }

        if segment.chars > 0 {
            chunks.push(self.emit(document, &segment, first_position + chunks.len()));
        }

        chunks
    }

    /// Open a segment at `start`. Its overlap reaches back no further than
    /// `floor`, the start of the previous chunk.
    fn next_segment(&self, text: &str, start: usize, floor: usize) -> Segment {
        let overlap = self.config.chunk_overlap;
        let available = char_len(&text[floor..start]);
        let want = overlap.min(available);

        let overlap_start = if want == 0 {
            start
        } else {
            let ceiling = (overlap + overlap / 2).min(available);
            let lo = back_chars(text, start, ceiling);
            let raw = back_chars(text, start, want);
            self.align_overlap(text, lo, raw, start, floor)
        };

        Segment {
            start,
            end: start,
            chars: 0,
            overlap_start,
            overlap_chars: char_len(&text[overlap_start..start]),
        }
    }

    /// Pick where the overlap begins so that it never starts mid-token.
    ///
    /// Prefers a boundary in `lo..=raw` (at least the wanted overlap), then
    /// the next boundary after `raw`. Inside a token that is itself cut at
    /// graphemes, `raw` is kept.
    fn align_overlap(&self, text: &str, lo: usize, raw: usize, start: usize, floor: usize) -> usize {
        let separators = &self.config.separators;
        if let Some(pos) = boundary_before(text, lo, raw, separators) {
            return pos;
        }
        if lo == floor && is_unit_boundary(text, floor, separators) {
            return floor;
        }
        match boundary_after(text, raw, start, separators) {
            Some(pos) => pos,
            None if self.cuts_graphemes() => raw,
            None => start,
        }
    }

    fn cuts_graphemes(&self) -> bool {
        self.config.separators.iter().any(String::is_empty)
    }

    /// Build the chunk for `segment`. A first unit too large for the planned
    /// overlap shortens it to fit the size limit.
    fn emit(&self, document: &Document, segment: &Segment, position: usize) -> Chunk {
        let text = document.text.as_str();
        let max = self.config.max_chunk_size;

        let start = if segment.overlap_chars + segment.chars <= max {
            segment.overlap_start
        } else {
            let allowed = max.saturating_sub(segment.chars);
            let want = self.config.chunk_overlap.min(allowed);
            if want == 0 {
                segment.start
            } else {
                let lo = back_chars(text, segment.start, allowed);
                let raw = back_chars(text, segment.start, want);
                self.align_overlap(text, lo, raw, segment.start, segment.overlap_start)
            }
        };

        Chunk::new(
            &document.source_id,
            position,
            &text[start..segment.end],
            (start, segment.end),
            segment.start - start,
        )
    }
}

/// Non-overlapping part of the chunk under construction.
#[derive(Debug, Default)]
struct Segment {
    /// Byte offset where the segment begins
    start: usize,
    /// Byte offset where the segment ends
    end: usize,
    /// Characters in the segment
    chars: usize,
    /// Byte offset where the planned overlap begins
    overlap_start: usize,
    overlap_chars: usize,
}
