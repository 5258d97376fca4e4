//! Treatment handlers.

use axum::{Json, extract::State};
use datamend::{SelectionRequest, TreatmentReport};
use serde::Serialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Response for treatment endpoints.
#[derive(Serialize)]
pub struct TreatmentResponse {
    pub message: String,
    pub report: TreatmentReport,
}

impl From<TreatmentReport> for TreatmentResponse {
    fn from(report: TreatmentReport) -> Self {
        Self {
            message: report.message(),
            report,
        }
    }
}

/// POST /apply_treatment
pub async fn apply_treatment(
    State(state): State<AppState>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<TreatmentResponse>, ApiError> {
    let mut store = state.store.write().await;
    let report = store.apply_request(&req)?;
    Ok(Json(report.into()))
}

/// POST /apply_missing_value_treatment
///
/// Same body as `/apply_treatment`; every interval must be a value gap.
pub async fn apply_missing_value_treatment(
    State(state): State<AppState>,
    Json(req): Json<SelectionRequest>,
) -> Result<Json<TreatmentResponse>, ApiError> {
    let mut store = state.store.write().await;
    let report = store.apply_value_gap_request(&req)?;
    Ok(Json(report.into()))
}
