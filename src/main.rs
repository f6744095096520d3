//! A web server which hides an email address behind a reCAPTCHA, disclosing it only to users who
//! pass.

mod api;
mod config;
mod render;
mod router;

use std::sync::Arc;

use tokio::{net::TcpListener, signal};
use tracing_subscriber::EnvFilter;

use crate::{config::Config, router::AppState};

/// # Errors
///
/// See implementation.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;
    tracing::debug!(?config, "Loaded config");

    let address = config.address.clone();
    let variant = config.variant;

    let state = AppState::new(config)?;

    tracing::info!(%address, %variant, "Listening...");

    let listener = TcpListener::bind(&address).await?;

    tracing::info!("Ready!");

    axum::serve(listener, router::router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolves when the process receives Ctrl-C.
async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => tracing::info!("Shutting down..."),
        Err(error) => {
            tracing::error!(%error, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    }
}
