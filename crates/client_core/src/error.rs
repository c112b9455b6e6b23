use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("server returned {status} {status_text}")]
    Status {
        status: u16,
        status_text: String,
        detail: Option<String>,
    },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
}

impl TransportError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }

    /// Text shown to the user when a submission fails.
    ///
    /// Server rejections prefer the `detail` the backend sent and fall back
    /// to the HTTP status text.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                status_text,
                detail,
                ..
            } => format!("Error: {}", detail.as_deref().unwrap_or(status_text)),
            Self::Network(cause) | Self::Decode(cause) => format!("Network error: {cause}"),
            Self::InvalidUrl(_) => format!("Network error: {self}"),
        }
    }
}
