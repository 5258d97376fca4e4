//! The unified prompt result.

use serde::{Deserialize, Serialize};

/// A rendered image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePayload {
    pub media_type: String,
    pub content: String,
}

impl ImagePayload {
    pub fn svg(content: String) -> Self {
        Self {
            media_type: "image/svg+xml".to_string(),
            content,
        }
    }
}

/// What a prompt produced. Serializes as `{"type": ..., "data": ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PromptResponse {
    Text(String),
    /// Plotly figure: `{data: [traces], layout, meta}`.
    Plot(serde_json::Value),
    Image(ImagePayload),
}

impl PromptResponse {
    pub fn kind(&self) -> &'static str {
        match self {
            PromptResponse::Text(_) => "text",
            PromptResponse::Plot(_) => "plot",
            PromptResponse::Image(_) => "image",
        }
    }
}
