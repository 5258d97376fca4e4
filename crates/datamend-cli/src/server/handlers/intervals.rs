//! Gap detection handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use datamend::Interval;
use serde::{Deserialize, Serialize};

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Response for the datetime gap endpoint.
#[derive(Serialize)]
pub struct DatetimeIntervalsResponse {
    pub intervals: Vec<Interval>,
    /// Sampling period the gaps were measured against.
    pub expected_period_seconds: Option<f64>,
    pub generation: u64,
}

/// Column selection for value-gap detection.
#[derive(Deserialize)]
pub struct ColumnRequest {
    pub column: String,
}

/// Response for the value gap endpoint.
#[derive(Serialize)]
pub struct ValueIntervalsResponse {
    pub column: String,
    pub intervals: Vec<Interval>,
    pub generation: u64,
}

/// GET /missing_datetime_intervals
pub async fn missing_datetime_intervals(
    State(state): State<AppState>,
) -> Result<Json<DatetimeIntervalsResponse>, ApiError> {
    let mut store = state.store.write().await;
    let run = store.detect_datetime_gaps()?;

    Ok(Json(DatetimeIntervalsResponse {
        expected_period_seconds: run.expected_period_ms.map(|ms| ms as f64 / 1000.0),
        generation: run.generation,
        intervals: run.intervals,
    }))
}

/// GET /missing_value_intervals?column=<name>
pub async fn missing_value_intervals_query(
    State(state): State<AppState>,
    Query(req): Query<ColumnRequest>,
) -> Result<Json<ValueIntervalsResponse>, ApiError> {
    value_intervals(&state, &req.column).await
}

/// POST /missing_value_intervals
pub async fn missing_value_intervals(
    State(state): State<AppState>,
    Json(req): Json<ColumnRequest>,
) -> Result<Json<ValueIntervalsResponse>, ApiError> {
    value_intervals(&state, &req.column).await
}

async fn value_intervals(state: &AppState, column: &str) -> Result<Json<ValueIntervalsResponse>, ApiError> {
    let mut store = state.store.write().await;
    let run = store.detect_value_gaps(column)?;

    Ok(Json(ValueIntervalsResponse {
        column: run.column.unwrap_or_else(|| column.to_string()),
        generation: run.generation,
        intervals: run.intervals,
    }))
}
