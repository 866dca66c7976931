//! Ask command handler.
//!
//! Runs one question through the pipeline lifecycle and prints the answer
//! followed by its citations.

use clap::Args;
use inquiry_core::{config::AppConfig, AppError, AppResult};
use inquiry_knowledge::{Lifecycle, QueryResponse, QueryStatus};

/// Ask one question
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing ask command");

        let lifecycle = Lifecycle::from_config(config)?;
        let response = lifecycle.query(&self.question).await;
        tracing::debug!(status = ?response.status, citations = response.citations.len(), "Query finished");

        if self.json {
            let json = serde_json::to_string_pretty(&response)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            print!("{}", render_text(&response));
        }

        if response.status == QueryStatus::NotInitialized {
            if let inquiry_knowledge::PipelineStatus::Failed { reason } = lifecycle.status() {
                tracing::warn!("Pipeline unavailable: {}", reason);
            }
        }

        Ok(())
    }
}

/// Plain-text rendering: answer, blank line, numbered sources.
fn render_text(response: &QueryResponse) -> String {
    let mut out = format!("{}\n", response.answer);
    if !response.citations.is_empty() {
        out.push_str("\nSources:\n");
        for (i, citation) in response.citations.iter().enumerate() {
            out.push_str(&format!(
                "  [{}] {} (chunk {}): {}\n",
                i + 1,
                citation.source,
                citation.position,
                citation.source_text_preview
            ));
        }
    }
    out
}
