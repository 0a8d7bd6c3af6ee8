//! Static file server for local development.
//!
//! Serves the configured root directory (the prototype pages and the
//! generated images) over plain HTTP. No routing beyond file lookup and no
//! shared mutable state; each connection is handled by the tokio runtime.
//!
//! # CORS
//!
//! All origins, methods and headers are permitted so pages served from a
//! different local port can still fetch images.

use anyhow::{Context, Result};
use axum::Router;
use std::path::Path;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::config::ServerConfig;

/// Router serving files under `root`.
pub fn router(root: &Path) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .fallback_service(ServeDir::new(root))
        .layer(cors)
}

/// Bind and serve until the process is terminated.
///
/// `port` overrides `[server].port` when given.
pub async fn run_server(config: &ServerConfig, port: Option<u16>) -> Result<()> {
    let port = port.unwrap_or(config.port);
    let bind_addr = format!("{}:{}", config.bind, port);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::debug!(root = %config.root.display(), %bind_addr, "static server starting");
    println!("Serving on http://localhost:{}", port);

    axum::serve(listener, router(&config.root)).await?;
    Ok(())
}
