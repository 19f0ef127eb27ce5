//! Resume ingestion and query pipeline.
//!
//! Upload: document kind → text → fields → embedding → index insert.
//! Search: query text → embedding → top-k index search.

pub mod handlers;

use std::path::Path;

use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::extraction::{extract_text, DocumentKind, ExtractionError};
use crate::fields::extract_fields;
use crate::index::IndexError;
use crate::models::profile::{Profile, ScoredProfile};
use crate::state::AppState;

/// Extracts, classifies, embeds and indexes one uploaded resume.
pub async fn ingest_document(
    state: &AppState,
    filename: Option<&str>,
    bytes: Bytes,
) -> Result<Profile, AppError> {
    let profile_id = profile_id_for(filename);
    let kind = resolve_kind(filename, &bytes)?;

    let text = extract_text(bytes, kind, &state.config.ocr).await?;
    let fields = extract_fields(&text);
    let embedding = state.embedder.embed(&text).await?;

    state
        .index
        .insert(profile_id.clone(), embedding, fields.clone())?;

    info!(
        id = %profile_id,
        ?kind,
        domain = fields.domain.as_str(),
        skills = fields.skills.len(),
        profiles = state.index.len(),
        "Indexed resume"
    );

    Ok(Profile::new(profile_id, fields))
}

/// Embeds `query` and returns the `k` most similar indexed profiles.
pub async fn search_profiles(
    state: &AppState,
    query: &str,
    k: i64,
) -> Result<Vec<ScoredProfile>, AppError> {
    if query.trim().is_empty() {
        return Err(AppError::Validation("query 'q' must not be empty".to_string()));
    }
    let top_k = match usize::try_from(k) {
        Ok(k) if k > 0 => k,
        _ => return Err(IndexError::InvalidTopK.into()),
    };

    let embedding = state.embedder.embed(query).await?;
    let results = state.index.search(&embedding, top_k)?;

    info!(k = top_k, hits = results.len(), "Searched profiles");
    Ok(results)
}

/// The upload's base file name, or a fresh UUID when none was sent.
fn profile_id_for(filename: Option<&str>) -> String {
    filename
        .and_then(|name| {
            // Browsers on Windows may send full paths with backslashes.
            let name = name.rsplit(&['/', '\\'][..]).next().unwrap_or(name);
            Path::new(name).file_name().and_then(|n| n.to_str())
        })
        .filter(|name| !name.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Extension first; content sniffing only when the name has no extension.
fn resolve_kind(filename: Option<&str>, bytes: &[u8]) -> Result<DocumentKind, ExtractionError> {
    let has_extension = filename
        .map(|name| Path::new(name).extension().is_some())
        .unwrap_or(false);

    match filename {
        Some(name) if has_extension => DocumentKind::from_filename(name),
        _ => DocumentKind::sniff(bytes).ok_or_else(|| {
            ExtractionError::UnsupportedFormat(filename.unwrap_or("unnamed upload").to_string())
        }),
    }
}
