//! Prompt types for grounded answering.

use serde::{Deserialize, Serialize};

/// Default instruction restricting the model to the supplied context.
pub const DEFAULT_INSTRUCTION: &str = "You are an authoritative internal inquiry assistant. \
Your sole purpose is to assist domain specialists by providing accurate information from the \
provided context. Answer the user's question concisely, using only the information from the \
'Context' below. If the context does not contain the answer, say that you do not know. \
You MUST cite the source section(s) that supported your answer at the end of your response.";

/// Handlebars template for the system message.
pub const DEFAULT_SYSTEM_TEMPLATE: &str = "{{instruction}}\n\nContext:\n{{context}}";

/// Separator placed between retrieved passages.
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Grounding prompt definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingTemplate {
    /// Instruction text placed ahead of the context
    #[serde(default = "default_instruction")]
    pub instruction: String,

    /// System message template with Handlebars syntax.
    /// Receives `instruction`, `context` and `query`.
    #[serde(rename = "systemTemplate", default = "default_system_template")]
    pub system_template: String,
}

fn default_instruction() -> String {
    DEFAULT_INSTRUCTION.to_string()
}

fn default_system_template() -> String {
    DEFAULT_SYSTEM_TEMPLATE.to_string()
}

impl Default for GroundingTemplate {
    fn default() -> Self {
        Self {
            instruction: default_instruction(),
            system_template: default_system_template(),
        }
    }
}

/// A rendered prompt ready for LLM execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message: instruction followed by the context block
    pub system: String,

    /// User message: the question, verbatim
    pub user: String,

    /// Number of passages placed in the context
    pub context_count: usize,
}
