use axum::{
    extract::{multipart::MultipartError, rejection::QueryRejection, Multipart, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::ingest::{ingest_document, search_profiles};
use crate::models::profile::{Profile, ScoredProfile};
use crate::state::AppState;

const UPLOAD_FIELD: &str = "file";

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    pub k: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IndexStatsResponse {
    pub dimension: usize,
    pub profiles: usize,
    pub embedder: String,
}

/// POST /upload
/// Multipart form with the resume under the `file` field.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Profile>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&state, "Malformed multipart body", e))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| multipart_error(&state, "Failed to read upload", e))?;

        let profile = ingest_document(&state, filename.as_deref(), data).await?;
        return Ok(Json(profile));
    }

    Err(AppError::Validation(format!(
        "Missing multipart field '{UPLOAD_FIELD}'"
    )))
}

/// Reading past `DefaultBodyLimit` surfaces as a multipart error carrying 413.
fn multipart_error(state: &AppState, context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return AppError::PayloadTooLarge {
            limit: state.config.max_upload_bytes,
        };
    }
    AppError::Validation(format!("{context}: {}", e.body_text()))
}

/// GET /search?q=...&k=5
pub async fn handle_search(
    State(state): State<AppState>,
    query: Result<Query<SearchQuery>, QueryRejection>,
) -> Result<Json<Vec<ScoredProfile>>, AppError> {
    let Query(params) = query.map_err(|e| AppError::Validation(e.body_text()))?;
    let k = params.k.unwrap_or(state.config.default_top_k as i64);
    let results = search_profiles(&state, &params.q, k).await?;
    Ok(Json(results))
}

/// GET /profiles/stats
pub async fn handle_stats(State(state): State<AppState>) -> Json<IndexStatsResponse> {
    let stats = state.index.stats();
    Json(IndexStatsResponse {
        dimension: stats.dimension,
        profiles: stats.profiles,
        embedder: state.embedder.name().to_string(),
    })
}
