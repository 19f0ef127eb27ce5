mod config;
mod embedding;
mod errors;
mod extraction;
mod fields;
mod index;
mod ingest;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::embedding::build_embedder;
use crate::index::ProfileIndex;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on invalid values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting profiles API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize embedder (hashing by default, HTTP model server via EMBEDDING_BACKEND)
    let embedder = build_embedder(&config.embedding_backend, config.embedding_dim)?;
    info!(
        "Embedder initialized (backend: {}, dimension: {})",
        embedder.name(),
        embedder.dimension()
    );

    // In-memory only: every restart begins with an empty index
    let index = Arc::new(ProfileIndex::new(config.embedding_dim)?);
    info!("Profile index initialized (dimension: {})", index.dimension());

    let state = AppState {
        index,
        embedder,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
