use std::str::FromStr;

use anyhow::{bail, Context, Result};

use crate::extraction::OcrConfig;
use crate::index::DEFAULT_DIMENSION;

const DEFAULT_TOP_K: usize = 5;
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which embedding model backs `embed(text)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingBackend {
    /// In-process feature hashing. No model download, no network.
    Hash,
    /// Remote sentence-embedding server.
    Http { url: String },
}

/// Application configuration loaded from environment variables.
/// Every variable has a default; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub embedding_dim: usize,
    pub embedding_backend: EmbeddingBackend,
    pub default_top_k: usize,
    pub max_upload_bytes: usize,
    pub ocr: OcrConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            rust_log: "info".to_string(),
            embedding_dim: DEFAULT_DIMENSION,
            embedding_backend: EmbeddingBackend::Hash,
            default_top_k: DEFAULT_TOP_K,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            ocr: OcrConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary key lookup, so tests don't touch
    /// the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let embedding_dim = parse_or(&lookup, "EMBEDDING_DIM", defaults.embedding_dim)?;
        if embedding_dim == 0 {
            bail!("EMBEDDING_DIM must be greater than zero");
        }

        let default_top_k = parse_or(&lookup, "DEFAULT_TOP_K", defaults.default_top_k)?;
        if default_top_k == 0 {
            bail!("DEFAULT_TOP_K must be greater than zero");
        }

        let backend = lookup("EMBEDDING_BACKEND").unwrap_or_else(|| "hash".to_string());
        let embedding_backend = match backend.trim().to_ascii_lowercase().as_str() {
            "hash" => EmbeddingBackend::Hash,
            "http" => EmbeddingBackend::Http {
                url: lookup("EMBEDDING_URL").context(
                    "Required environment variable 'EMBEDDING_URL' is not set (EMBEDDING_BACKEND=http)",
                )?,
            },
            other => bail!("Unknown EMBEDDING_BACKEND '{other}' (expected 'hash' or 'http')"),
        };

        Ok(Config {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            rust_log: lookup("RUST_LOG").unwrap_or(defaults.rust_log),
            embedding_dim,
            embedding_backend,
            default_top_k,
            max_upload_bytes: parse_or(&lookup, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
            ocr: OcrConfig {
                binary: lookup("TESSERACT_BIN").unwrap_or(defaults.ocr.binary),
                language: lookup("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        None => Ok(default),
    }
}
