//! Serve command handler.

use crate::server;
use clap::Args;
use inquiry_core::{config::AppConfig, AppError, AppResult};
use inquiry_knowledge::Lifecycle;
use std::sync::Arc;

/// Serve the HTTP chat endpoint
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Port to listen on (overrides SERVER_PORT and the config file)
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<()> {
        let port = self.port.unwrap_or(config.server.port);
        let lifecycle = Arc::new(Lifecycle::from_config(config)?);

        // Warm up so the first request does not pay for the index build.
        // A failure here is retried by the first query.
        let status = lifecycle.initialize().await;
        tracing::info!(pipeline = status.as_str(), "Initial pipeline state");

        server::run(lifecycle, &config.server.cors_origins, port)
            .await
            .map_err(|e| AppError::Other(format!("{:#}", e)))
    }
}
