//! Storage layer for vitalog.
//!
//! One table, two backends: a primary PostgreSQL database and an embedded
//! SQLite fallback, unified behind [`MeasurementStore`] and selected once at
//! startup by [`resolve_backend`].

mod backend;
mod error;
mod postgres;
mod resolver;
mod sqlite;
#[cfg(test)]
mod tests;

pub use backend::{MeasurementStore, StorageBackend};
pub use error::StorageError;
pub use postgres::PgStorage;
pub use resolver::{resolve_backend, select_sqlite_dir, BackendInfo, ResolvedBackend};
pub use sqlite::SqliteStore;

/// Name of the SQLite database file inside a resolved data directory.
pub const SQLITE_FILE_NAME: &str = "vitalog.db";
