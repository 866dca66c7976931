//! Prompt builder for rendering the grounding template.

use crate::types::{BuiltPrompt, GroundingTemplate, CONTEXT_SEPARATOR};
use handlebars::Handlebars;
use inquiry_core::{AppError, AppResult};
use std::collections::HashMap;

/// Build the grounding prompt for one question.
///
/// The system message carries the instruction and the retrieved passages
/// joined by blank lines, in the order given. The user message is the query
/// exactly as asked.
///
/// # Example
/// ```
/// use inquiry_prompt::{build_grounding_prompt, GroundingTemplate};
///
/// let built = build_grounding_prompt(
///     &GroundingTemplate::default(),
///     "What is the duty-free allowance?",
///     &["Section 4: travellers may bring goods worth $500 duty-free."],
/// )
/// .unwrap();
/// assert!(built.system.contains("Context:"));
/// assert_eq!(built.user, "What is the duty-free allowance?");
/// ```
pub fn build_grounding_prompt<S: AsRef<str>>(
    template: &GroundingTemplate,
    query: &str,
    contexts: &[S],
) -> AppResult<BuiltPrompt> {
    let context = contexts
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    let mut variables = HashMap::new();
    variables.insert("instruction", template.instruction.as_str());
    variables.insert("context", context.as_str());
    variables.insert("query", query);

    let system = render_template(&template.system_template, &variables)?;

    tracing::debug!(
        passages = contexts.len(),
        system_chars = system.chars().count(),
        "Built grounding prompt"
    );

    Ok(BuiltPrompt {
        system,
        user: query.to_string(),
        context_count: contexts.len(),
    })
}

/// Render a Handlebars template with variables.
pub fn render_template(template: &str, variables: &HashMap<&str, &str>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.set_strict_mode(true);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}
