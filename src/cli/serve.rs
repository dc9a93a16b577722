//! Serve command implementation

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use learnforge::api::{ApiServer, ApiState};
use learnforge::config::Config;
use learnforge::engine::Engine;

/// Run the HTTP API until Ctrl-C
pub async fn serve_command(config: Config, bind: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = config;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let engine = Arc::new(Engine::from_config(&config)?);
    let state = ApiState {
        engine,
        runtime: tokio::runtime::Handle::current(),
        max_body_bytes: config.server.max_body_bytes,
    };

    let server = Arc::new(ApiServer::bind(&config.bind_addr(), state)?);
    let runner = Arc::clone(&server);
    let worker = tokio::task::spawn_blocking(move || runner.run());

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    info!("[learnforge:http] Shutting down");
    server.stop();
    worker.await.context("Server thread panicked")?;

    Ok(())
}
