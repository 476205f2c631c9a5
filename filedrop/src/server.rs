//! HTTP server wiring: shared state, router and listener.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use filedrop_core::StorageCore;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::handlers::{download_file, missing_name, upload_file};

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageCore>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(storage: StorageCore, config: ServerConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            config: Arc::new(config),
        }
    }
}

/// Build the router for the upload and download endpoints.
pub fn router(state: AppState) -> Router {
    let body_limit = match state.config.max_upload_bytes {
        0 => DefaultBodyLimit::disable(),
        limit => DefaultBodyLimit::max(limit),
    };

    Router::new()
        .route("/api/file", post(upload_file).get(missing_name))
        .route("/api/file/", get(missing_name))
        .route("/api/file/{name}", get(download_file))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until interrupted.
pub async fn run_server(state: AppState) -> Result<()> {
    if state.config.password.as_deref().is_none_or(str::is_empty) {
        warn!("no upload password configured; every upload will be rejected");
    }

    let listener = tokio::net::TcpListener::bind(state.config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", state.config.bind))?;

    info!(
        addr = %listener.local_addr()?,
        root = %state.storage.root().display(),
        "filedrop listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("received Ctrl+C, shutting down");
    }
}
