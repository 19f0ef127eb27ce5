use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{debug, warn};

use super::{Embedder, EmbeddingError};
use crate::index::similarity::normalize;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    inputs: [&'a str; 1],
}

/// Client for a sentence-embedding server exposing `POST <url>` with
/// `{"inputs": [text]}` and answering `[[f32; D]]`
/// (text-embeddings-inference style).
///
/// No retries: an unreachable or failing server surfaces as
/// `EmbeddingError::Unavailable` on the request that hit it.
#[derive(Clone)]
pub struct HttpEmbedder {
    client: Client,
    url: String,
    dimension: usize,
}

impl HttpEmbedder {
    pub fn new(url: String, dimension: usize) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build embedding HTTP client")?;
        Ok(Self {
            client,
            url,
            dimension,
        })
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn name(&self) -> &str {
        "http"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(&self.url)
            .json(&EmbedRequest { inputs: [text] })
            .send()
            .await
            .map_err(|e| {
                warn!("Embedding server unreachable: {e}");
                EmbeddingError::Unavailable(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Embedding server returned {status}: {body}");
            return Err(EmbeddingError::Unavailable(format!(
                "embedding server returned {status}"
            )));
        }

        let mut batch: Vec<Vec<f32>> = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Unavailable(format!("malformed response: {e}")))?;

        let mut vector = batch
            .pop()
            .ok_or_else(|| EmbeddingError::Unavailable("empty embedding batch".to_string()))?;

        if vector.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }

        normalize(&mut vector);
        debug!(dimension = vector.len(), "Received embedding");
        Ok(vector)
    }
}
