//! Prompt system for Inquiry.
//!
//! Renders the grounding prompt handed to the generative model: a fixed
//! instruction plus retrieved context in the system message, the question in
//! the user message. Templates use Handlebars with HTML escaping disabled.

pub mod builder;
pub mod types;

// Re-export main types
pub use builder::{build_grounding_prompt, render_template};
pub use types::{BuiltPrompt, GroundingTemplate, DEFAULT_INSTRUCTION, DEFAULT_SYSTEM_TEMPLATE};
