//! hourglass-web — Axum web server entry point.
//! Loads config, wires store + channel + bot, serves the activity API.

mod server;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use hourglass_core::bot::Bot;
use hourglass_core::channel::BroadcastChannel;
use hourglass_core::config::Config;
use hourglass_core::coordinator::TurnCoordinator;

use server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let config = Config::load_or_default(&project_root)?;
    info!(
        "Completion delay [1, {}) s, poll every {} s, max wait {:?}",
        config.max_delay_seconds, config.poll_interval_seconds, config.max_wait_seconds
    );

    let store = config.open_store()?;
    let channel = Arc::new(BroadcastChannel::default());
    let coordinator = TurnCoordinator::from_config(&config, store, channel.clone())?;
    let coordinator = Arc::new(coordinator);

    let state = Arc::new(AppState {
        bot: Bot::new(Arc::clone(&coordinator)),
        channel,
    });
    let app = server::router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3978);
    let addr = format!("0.0.0.0:{}", port);

    eprintln!("\n  POST activities to http://localhost:{}/api/messages\n", port);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    // Graceful shutdown on Ctrl+C
    let supervisor = Arc::clone(coordinator.supervisor());
    let shutdown = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received, stopping workers...");
        supervisor.shutdown().await;
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    info!("Server stopped.");
    Ok(())
}
