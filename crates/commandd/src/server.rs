//! HTTP server for commandd

use crate::middleware;
use crate::repo::CommandStore;
use crate::routes;
use anyhow::{Context, Result};
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<dyn CommandStore>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: Arc<dyn CommandStore>) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

/// Assemble the router with its middleware stack
pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    let state = Arc::new(state);

    Router::new()
        .merge(routes::command_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(middleware::log_requests))
        .layer(middleware::body_limit(max_body_bytes))
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server until ctrl-c
pub async fn run(state: AppState, bind_address: &str, max_body_bytes: usize) -> Result<()> {
    let app = router(state, max_body_bytes);

    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("  Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Shutting down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
