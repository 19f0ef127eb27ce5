//! Text embedding: pluggable, trait-based embedders producing fixed-width vectors.
//!
//! Default: `HashingEmbedder` (pure-Rust feature hashing, offline, deterministic).
//! Alternative: `HttpEmbedder` (sentence-transformer served over HTTP).
//!
//! `AppState` holds an `Arc<dyn Embedder>`, chosen at startup via `EMBEDDING_BACKEND`.

pub mod hashing;
pub mod http;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

use crate::config::EmbeddingBackend;

pub use hashing::HashingEmbedder;
pub use http::HttpEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model unavailable: {0}")]
    Unavailable(String),

    #[error("embedding model returned {actual} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// The embedder trait. Implement this to swap models without touching the
/// index, the ingestion pipeline or the handlers.
///
/// Every vector returned by `embed` has exactly `dimension()` entries.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Short backend label, reported by the stats endpoint.
    fn name(&self) -> &str;

    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Builds the configured embedder.
pub fn build_embedder(backend: &EmbeddingBackend, dimension: usize) -> Result<Arc<dyn Embedder>> {
    let embedder: Arc<dyn Embedder> = match backend {
        EmbeddingBackend::Hash => Arc::new(HashingEmbedder::new(dimension)),
        EmbeddingBackend::Http { url } => Arc::new(HttpEmbedder::new(url.clone(), dimension)?),
    };
    Ok(embedder)
}
