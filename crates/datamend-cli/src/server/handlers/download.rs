//! Dataset download handler.

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use datamend::ExportFormat;
use serde::Deserialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

#[derive(Deserialize)]
pub struct DownloadQuery {
    pub format: Option<String>,
}

/// GET /download?format=csv|tsv|json
pub async fn download(
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, ApiError> {
    let format = query
        .format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()?;

    let store = state.store.read().await;
    let file = store.export(format)?;

    Ok((
        [
            (header::CONTENT_TYPE, file.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", file.file_name.replace('"', "")),
            ),
        ],
        file.bytes,
    )
        .into_response())
}
