//! Grounded answer generation.

pub mod synthesize;
pub mod types;

pub use synthesize::{Synthesizer, ANSWER_TEMPERATURE};
pub use types::{
    preview, Answer, Citation, QueryResponse, QueryStatus, MAX_PREVIEW_CHARS, NO_CONTEXT_ANSWER,
    NOT_INITIALIZED_ANSWER,
};
