//! Analysis prompt handler.

use axum::{Json, extract::State};
use datamend::prompt::ACCEPTED_PROMPTS;
use datamend::{DatamendError, PromptResponse};
use serde::Deserialize;

use crate::server::error::ApiError;
use crate::server::state::AppState;

/// Request body for the chat endpoint.
#[derive(Deserialize)]
pub struct ChatRequest {
    pub prompt: String,
}

/// POST /chat
///
/// Prompts that cannot be classified come back as a text response listing
/// the accepted phrasings.
pub async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<PromptResponse>, ApiError> {
    let store = state.store.read().await;
    match store.dispatch(&req.prompt) {
        Ok(response) => Ok(Json(response)),
        Err(DatamendError::PromptParse(reason)) => Ok(Json(PromptResponse::Text(format!(
            "Sorry, I could not understand that: {}.\nTry one of:\n{}",
            reason, ACCEPTED_PROMPTS
        )))),
        Err(e) => Err(e.into()),
    }
}
