//! Typed error enum for the service layer.

use thiserror::Error;
use vitalog_channel::ChannelError;
use vitalog_storage::StorageError;

/// Service-layer error unifying storage and channel failures.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage operation failed.
    #[error("storage: {0}")]
    Storage(#[from] StorageError),

    /// Backup channel call failed.
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),

    /// Caller provided invalid input (missing value, unknown artifact type).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Operation needs the backup channel but none is configured.
    #[error("not configured: {0}")]
    NotConfigured(String),

    /// Serialization failed in the service layer.
    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ServiceError {
    /// Whether this error is a caller-input problem (HTTP 400 territory).
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Self::InvalidInput(_) => true,
            Self::Storage(e) => e.is_validation(),
            _ => false,
        }
    }
}
