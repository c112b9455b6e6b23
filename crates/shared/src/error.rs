use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Body the backend attaches to non-2xx responses.
///
/// `detail` is usually a string, but request validation failures carry a
/// structured list instead, so it is kept as raw JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

impl ApiErrorBody {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(Value::String(detail.into())),
        }
    }

    /// The detail, when it is a non-empty string.
    pub fn detail_text(&self) -> Option<&str> {
        match &self.detail {
            Some(Value::String(text)) if !text.trim().is_empty() => Some(text.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed status frame: {0}")]
    MalformedFrame(#[from] serde_json::Error),
}
