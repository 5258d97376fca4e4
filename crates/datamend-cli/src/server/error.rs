//! API error types and handling.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use datamend::DatamendError;
use serde::Serialize;
use tracing::error;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from client.
    BadRequest(String),
    /// Error from the datamend library.
    Datamend(DatamendError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
}

/// HTTP status for a library error.
fn status_for(err: &DatamendError) -> StatusCode {
    match err {
        DatamendError::NoActiveDataset | DatamendError::StaleGeneration { .. } => {
            StatusCode::CONFLICT
        }
        DatamendError::UnknownColumn(_) => StatusCode::NOT_FOUND,
        DatamendError::IntervalColumnMismatch { .. }
        | DatamendError::EmptySelection(_)
        | DatamendError::UnsupportedTreatmentMethod { .. }
        | DatamendError::SelectionTooLarge { .. }
        | DatamendError::NonNumericColumn(_) => StatusCode::UNPROCESSABLE_ENTITY,
        e if e.is_client_error() => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Datamend(e) => {
                let status = status_for(&e);
                if status.is_server_error() {
                    error!(kind = e.kind(), "request failed: {}", e);
                }
                (status, e.kind(), e.to_string())
            }
        };

        (
            status,
            Json(ErrorResponse {
                error: error.to_string(),
                message,
            }),
        )
            .into_response()
    }
}

impl From<DatamendError> for ApiError {
    fn from(err: DatamendError) -> Self {
        ApiError::Datamend(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Datamend(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(&DatamendError::NoActiveDataset), StatusCode::CONFLICT);
        assert_eq!(
            status_for(&DatamendError::UnknownColumn("x".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_for(&DatamendError::StaleGeneration {
                what: "interval".into(),
                current: 2
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&DatamendError::Upload("empty".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_for(&DatamendError::SelectionTooLarge {
                rows: 10,
                limit: 5
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_for(&DatamendError::Export("disk".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
