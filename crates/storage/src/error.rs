//! Typed error enum for the storage layer.

use thiserror::Error;

/// Storage-layer error covering both backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Bad or missing input to a write (non-numeric value, wrong backend for
    /// a snapshot operation).
    #[error("validation: {0}")]
    Validation(String),

    /// SQLite call failed.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// PostgreSQL call failed.
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    /// Filesystem failure around the SQLite file or a snapshot.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Blocking task running a SQLite operation was cancelled or panicked.
    #[error("blocking task failed: {0}")]
    Task(String),
}

impl StorageError {
    /// Whether this error is a caller-input problem rather than a backend
    /// failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Whether this error is likely transient (worth retrying later).
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Postgres(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) | Self::Io(_)
        )
    }
}
