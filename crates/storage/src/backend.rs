//! Unified storage backend with enum dispatch.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use vitalog_core::{Measurement, MeasurementRecord};

use crate::error::StorageError;
use crate::postgres::PgStorage;
use crate::sqlite::{run_blocking, SqliteStore};

/// Operations every storage backend provides.
///
/// All downstream components depend on this trait only; the concrete backend
/// is chosen once by the resolver.
#[async_trait]
pub trait MeasurementStore: Send + Sync {
    /// Idempotent schema creation/repair; safe on every startup.
    async fn ensure_schema(&self) -> Result<(), StorageError>;

    /// Inserts one measurement; `created_at` defaults to now. Returns the
    /// assigned id.
    async fn insert(
        &self,
        value: f64,
        note: &str,
        created_at: Option<NaiveDateTime>,
    ) -> Result<i64, StorageError>;

    /// All rows, `created_at` descending.
    async fn list_all(&self) -> Result<Vec<Measurement>, StorageError>;

    /// Row count; drives the startup-restore skip decision.
    async fn count(&self) -> Result<u64, StorageError>;

    /// Deletes all rows. Only used ahead of a replacing restore or an
    /// explicit reset.
    async fn clear(&self) -> Result<u64, StorageError>;

    /// Every row as an artifact-ready record, chronological.
    async fn export_all(&self) -> Result<Vec<MeasurementRecord>, StorageError>;

    /// Clear + bulk insert in a single transaction, preserving supplied
    /// timestamps. Returns the number of rows written.
    async fn restore_replace(
        &self,
        records: Vec<MeasurementRecord>,
    ) -> Result<usize, StorageError>;

    /// Raw database snapshot; `None` when the backend has no local file.
    async fn snapshot(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replaces the underlying file wholesale from an uploaded snapshot;
    /// validation error when the backend has no local file.
    async fn replace_snapshot(&self, bytes: Vec<u8>) -> Result<(), StorageError>;
}

/// The backend selected at startup.
#[derive(Debug, Clone)]
pub enum StorageBackend {
    Sqlite(SqliteStore),
    Postgres(PgStorage),
}

macro_rules! dispatch {
    ($self:expr, $method:ident ( $($arg:expr),* $(,)? )) => {
        match $self {
            StorageBackend::Sqlite(s) => {
                <SqliteStore as MeasurementStore>::$method(s, $($arg),*).await
            }
            StorageBackend::Postgres(s) => {
                <PgStorage as MeasurementStore>::$method(s, $($arg),*).await
            }
        }
    };
}

#[async_trait]
impl MeasurementStore for StorageBackend {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        dispatch!(self, ensure_schema())
    }

    async fn insert(
        &self,
        value: f64,
        note: &str,
        created_at: Option<NaiveDateTime>,
    ) -> Result<i64, StorageError> {
        dispatch!(self, insert(value, note, created_at))
    }

    async fn list_all(&self) -> Result<Vec<Measurement>, StorageError> {
        dispatch!(self, list_all())
    }

    async fn count(&self) -> Result<u64, StorageError> {
        dispatch!(self, count())
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        dispatch!(self, clear())
    }

    async fn export_all(&self) -> Result<Vec<MeasurementRecord>, StorageError> {
        dispatch!(self, export_all())
    }

    async fn restore_replace(
        &self,
        records: Vec<MeasurementRecord>,
    ) -> Result<usize, StorageError> {
        dispatch!(self, restore_replace(records))
    }

    async fn snapshot(&self) -> Result<Option<Vec<u8>>, StorageError> {
        dispatch!(self, snapshot())
    }

    async fn replace_snapshot(&self, bytes: Vec<u8>) -> Result<(), StorageError> {
        dispatch!(self, replace_snapshot(bytes))
    }
}

#[async_trait]
impl MeasurementStore for SqliteStore {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        let store = self.clone();
        run_blocking(move || store.ensure_schema_sync()).await
    }

    async fn insert(
        &self,
        value: f64,
        note: &str,
        created_at: Option<NaiveDateTime>,
    ) -> Result<i64, StorageError> {
        let store = self.clone();
        let note = note.to_owned();
        run_blocking(move || store.insert_sync(value, &note, created_at)).await
    }

    async fn list_all(&self) -> Result<Vec<Measurement>, StorageError> {
        let store = self.clone();
        run_blocking(move || store.list_all_sync()).await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let store = self.clone();
        run_blocking(move || store.count_sync()).await
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        let store = self.clone();
        run_blocking(move || store.clear_sync()).await
    }

    async fn export_all(&self) -> Result<Vec<MeasurementRecord>, StorageError> {
        let store = self.clone();
        run_blocking(move || store.export_all_sync()).await
    }

    async fn restore_replace(
        &self,
        records: Vec<MeasurementRecord>,
    ) -> Result<usize, StorageError> {
        let store = self.clone();
        run_blocking(move || store.restore_replace_sync(&records)).await
    }

    async fn snapshot(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let store = self.clone();
        run_blocking(move || store.snapshot_sync().map(Some)).await
    }

    async fn replace_snapshot(&self, bytes: Vec<u8>) -> Result<(), StorageError> {
        let store = self.clone();
        run_blocking(move || store.replace_snapshot_sync(&bytes)).await
    }
}

#[async_trait]
impl MeasurementStore for PgStorage {
    async fn ensure_schema(&self) -> Result<(), StorageError> {
        Self::ensure_schema(self).await
    }

    async fn insert(
        &self,
        value: f64,
        note: &str,
        created_at: Option<NaiveDateTime>,
    ) -> Result<i64, StorageError> {
        Self::insert(self, value, note, created_at).await
    }

    async fn list_all(&self) -> Result<Vec<Measurement>, StorageError> {
        Self::list_all(self).await
    }

    async fn count(&self) -> Result<u64, StorageError> {
        Self::count(self).await
    }

    async fn clear(&self) -> Result<u64, StorageError> {
        Self::clear(self).await
    }

    async fn export_all(&self) -> Result<Vec<MeasurementRecord>, StorageError> {
        Self::export_all(self).await
    }

    async fn restore_replace(
        &self,
        records: Vec<MeasurementRecord>,
    ) -> Result<usize, StorageError> {
        Self::restore_replace(self, &records).await
    }

    /// A remote database has no local file to snapshot.
    async fn snapshot(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(None)
    }

    async fn replace_snapshot(&self, _bytes: Vec<u8>) -> Result<(), StorageError> {
        Err(StorageError::Validation(
            "raw snapshots are not supported on the postgres backend".to_owned(),
        ))
    }
}
