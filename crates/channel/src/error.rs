//! Typed error enum for the backup channel.

use thiserror::Error;

/// Errors from backup-channel operations. Always non-fatal for the store;
/// manual operations surface them, background triggers log and continue.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),
    #[error("HTTP status {code}: {body}")]
    HttpStatus { code: u16, body: String },
    #[error("channel rejected request: {0}")]
    Rejected(String),
    #[error("JSON parse error in {context}: {source}")]
    JsonParse {
        context: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("attachment unavailable: {0}")]
    MissingAttachment(String),
    #[error("client initialization failed: {0}")]
    ClientInit(String),
}

impl ChannelError {
    /// Whether this error is transient (network or server-side hiccup).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::HttpRequest(_) => true,
            Self::HttpStatus { code, .. } => matches!(code, 429 | 500 | 502 | 503 | 504),
            _ => false,
        }
    }
}
