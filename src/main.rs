//! Role-play session server
//!
//! Entry point: loads configuration, sets up logging and serves the API.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;

use roleplay_sessions::{config::AppConfig, server, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present) before clap and config read the environment
    let _ = dotenv();

    let config = AppConfig::load().context("failed to load configuration")?;

    // Initialize tracing (M-LOG-STRUCTURED)
    telemetry::init(config.logging.format);

    server::start_server(Arc::new(config)).await
}
