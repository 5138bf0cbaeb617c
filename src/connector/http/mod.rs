mod error;
mod handlers;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

use super::api::Container;

pub use error::status_for;
pub use types::*;

pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Maximum accepted request body, in bytes.
    pub body_limit: usize,
}

/// Builds the HTTP application over a shared container.
pub fn create_app(container: Arc<Container>, body_limit: usize) -> axum::Router {
    axum::Router::new()
        .route("/upload", post(handlers::upload_handler))
        .route("/search", post(handlers::search_handler))
        .route("/health", get(handlers::health_handler))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(body_limit))
        .with_state(container)
}

pub async fn serve(container: Arc<Container>, config: ServerConfig) -> Result<()> {
    let app = create_app(container, config.body_limit);

    info!("starting server at http://{}", config.addr);
    let listener = TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
