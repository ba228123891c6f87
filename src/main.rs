// ============================
// src/main.rs
// ============================
//! Tokio / Axum entry-point for the huddle signaling hub.

use anyhow::Result;
use metrics::counter;
use signaling_lib::{config::Settings, metrics::ROOMS_SWEPT, ws_router, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::interval;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Initialize configuration
    let settings = Settings::load().unwrap_or_else(|e| {
        warn!(error = %e, "failed to load configuration, using defaults");
        Settings::default()
    });

    // Create application state
    let state = Arc::new(AppState::new(settings));

    // Background task: evict rooms whose activity timestamp has gone stale
    let sweeper = state.clone();
    tokio::spawn(async move {
        let mut tick = interval(sweeper.settings.sweep_interval());
        loop {
            tick.tick().await;
            let evicted = sweeper
                .registry
                .sweep_idle(sweeper.settings.idle_timeout());
            if !evicted.is_empty() {
                counter!(ROOMS_SWEPT).increment(evicted.len() as u64);
                info!(count = evicted.len(), rooms = ?evicted, "swept idle rooms");
            }
        }
    });

    // Build the router and start the server
    let app = ws_router::create_router(state.clone());
    let addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Resolve on SIGINT or SIGTERM so axum can stop accepting, drain live
/// connections and exit.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received");
}
