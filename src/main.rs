//! CGPA results bot: scrapes a university results portal by roll number and
//! answers over Telegram, with an optional PDF marksheet.

mod bot;
mod config;
mod extractor;
mod pdf;

use crate::bot::{AppState, MemorySessionStore};
use crate::config::BotConfig;
use crate::extractor::{FetchOrchestrator, HttpTransport, OrchestratorConfig};
use anyhow::Context;
use std::sync::Arc;
use teloxide::Bot;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = BotConfig::from_env().context("invalid startup configuration")?;

    let mut orchestrator_config = OrchestratorConfig::default();
    if let Some(results_url) = config.results_url.clone() {
        orchestrator_config.results_url = results_url;
    }
    info!(results_url = %orchestrator_config.results_url, "starting cgpabot");

    let transport =
        HttpTransport::new(&orchestrator_config).context("failed to build HTTP transport")?;
    let state = Arc::new(AppState {
        orchestrator: FetchOrchestrator::new(transport, orchestrator_config),
        sessions: Arc::new(MemorySessionStore::new()),
    });

    let telegram = Bot::new(config.token);
    bot::run(telegram, state).await;

    info!("dispatcher stopped, shutting down");
    Ok(())
}
