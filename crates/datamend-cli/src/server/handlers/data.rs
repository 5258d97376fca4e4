//! Upload, column listing and health handlers.

use axum::{
    Json,
    extract::{Multipart, State},
};
use datamend::UploadSummary;
use serde::Serialize;
use serde_json::{Value, json};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Response for the columns endpoint.
#[derive(Serialize)]
pub struct ColumnsResponse {
    pub columns: Vec<String>,
}

/// POST /upload
///
/// Multipart form with the file in field `file`.
pub async fn upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadSummary>, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let name = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let mut store = state.store.write().await;
        let summary = store.upload(&name, &bytes)?;
        return Ok(Json(summary));
    }

    Err(ApiError::BadRequest("Missing multipart field 'file'".to_string()))
}

/// GET /get_columns
pub async fn get_columns(State(state): State<AppState>) -> Result<Json<ColumnsResponse>, ApiError> {
    let store = state.store.read().await;
    Ok(Json(ColumnsResponse {
        columns: store.columns()?,
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
