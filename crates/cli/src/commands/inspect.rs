//! Inspect command handler.

use clap::Args;
use inquiry_core::{config::AppConfig, AppError, AppResult};
use inquiry_knowledge::{Lifecycle, PipelineSettings, PipelineStats, PipelineStatus};

/// Build the index and print statistics
#[derive(Args, Debug)]
pub struct InspectCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        tracing::info!("Executing inspect command");

        let lifecycle = Lifecycle::from_config(config)?;
        let status = lifecycle.initialize().await;

        let stats = match (status, lifecycle.stats()) {
            (_, Some(stats)) => stats,
            (PipelineStatus::Failed { reason }, None) => {
                return Err(AppError::Initialization(reason));
            }
            (other, None) => {
                return Err(AppError::Initialization(format!(
                    "Pipeline is {}",
                    other.as_str()
                )));
            }
        };

        if self.json {
            let json = serde_json::to_string_pretty(&stats)
                .map_err(|e| AppError::Serialization(e.to_string()))?;
            println!("{}", json);
        } else {
            print!("{}", render_text(lifecycle.settings(), &stats));
        }

        Ok(())
    }
}

fn render_text(settings: &PipelineSettings, stats: &PipelineStats) -> String {
    let index = &stats.index;
    [
        format!("Corpus:      {}", settings.corpus.display()),
        format!("Documents:   {}", stats.documents),
        format!("Chunks:      {}", index.chunks),
        format!(
            "Chunking:    {} chars, {} overlap",
            settings.chunking.max_chunk_size, settings.chunking.chunk_overlap
        ),
        format!("Dimensions:  {}", index.dimensions),
        format!("Metric:      {}", index.metric),
        format!("Embeddings:  {} ({})", index.embedding_provider, index.embedding_model),
        format!("Generator:   {} ({})", stats.llm_provider, stats.llm_model),
        format!("Top k:       {}", stats.top_k),
        format!("Built at:    {}", index.built_at.to_rfc3339()),
    ]
    .iter()
    .map(|line| format!("{line}\n"))
    .collect()
}
