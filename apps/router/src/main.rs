//! Chat routing service.
//!
//! ```text
//! CHATBOTS_FILE=chatbots.json BIND=127.0.0.1:8080 chatwidget-router
//! ```

use std::sync::Arc;

use anyhow::Result;
use chatwidget_router::{AppState, MemoryDirectory, RouterConfig, router};
use tokio::net::TcpListener;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    chatwidget_telemetry::install("chatwidget-router")?;

    let config = RouterConfig::from_env()?;
    let directory = match &config.chatbots_file {
        Some(path) => MemoryDirectory::load(path)?,
        None => {
            warn!("CHATBOTS_FILE not set; every chatbot id will be reported as not found");
            MemoryDirectory::new()
        }
    };
    let state = AppState::new(Arc::new(directory), config.webhook_timeout);

    info!(
        addr = %config.bind,
        webhook_timeout_secs = config.webhook_timeout.as_secs(),
        "chatwidget-router listening"
    );
    let listener = TcpListener::bind(config.bind).await?;
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
