//! Inquiry CLI
//!
//! Main entry point for the inquiry command-line tool.
//! Answers questions from a fixed knowledge base, once or over HTTP.

mod commands;
mod server;

use clap::{Parser, Subcommand};
use commands::{AskCommand, InspectCommand, ServeCommand};
use inquiry_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Inquiry - grounded answers from an internal knowledge base
#[derive(Parser, Debug)]
#[command(name = "inquiry")]
#[command(about = "Grounded question answering over a fixed corpus", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "INQUIRY_CONFIG")]
    config: Option<PathBuf>,

    /// Knowledge base file or directory
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// Generative model provider (openai, ollama, mock)
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Embedding provider (openai, ollama, mock)
    #[arg(long, global = true)]
    embedding_provider: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question against the knowledge base
    Ask(AskCommand),

    /// Serve the HTTP chat endpoint
    Serve(ServeCommand),

    /// Build the index and print its statistics
    Inspect(InspectCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Defaults, config file, environment
    let config = AppConfig::load_from(cli.config.as_deref())?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.corpus,
        cli.provider,
        cli.embedding_provider,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    logging::init_logging(config.log_level.as_deref(), config.no_color)?;
    config.validate()?;

    tracing::info!("Inquiry starting");
    tracing::debug!("Corpus: {:?}", config.corpus);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Embedding provider: {}", config.embedding_provider);

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Serve(_) => "serve",
        Commands::Inspect(_) => "inspect",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    let result = match cli.command {
        Commands::Ask(cmd) => cmd.execute(&config).await,
        Commands::Serve(cmd) => cmd.execute(&config).await,
        Commands::Inspect(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
