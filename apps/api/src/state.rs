use std::sync::Arc;

use crate::config::Config;
use crate::embedding::Embedder;
use crate::index::ProfileIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The process-wide profile index. Created empty at startup, never persisted.
    pub index: Arc<ProfileIndex>,
    /// Pluggable embedder. Default: HashingEmbedder. Swap via EMBEDDING_BACKEND.
    pub embedder: Arc<dyn Embedder>,
    pub config: Config,
}
