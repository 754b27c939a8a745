//! Embedded SQLite backend.
//!
//! Every operation opens and closes its own connection; there is no pool and
//! no long-lived transaction spanning requests. WAL mode plus a busy timeout
//! cover the short single-statement writes this service performs.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use vitalog_core::{now, parse_timestamp, Measurement, MeasurementRecord, TIMESTAMP_FORMAT};

use crate::error::StorageError;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS measurements (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    value REAL NOT NULL,
    note TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_measurements_created ON measurements(created_at);
";

/// SQLite-backed measurement store. Cheap to clone; holds only the file path.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    path: PathBuf,
}

fn read_created_at(raw: &str) -> NaiveDateTime {
    parse_timestamp(raw).unwrap_or_else(|| {
        tracing::warn!(value = raw, "unparseable created_at in store, substituting now");
        now()
    })
}

impl SqliteStore {
    /// Creates a store for the given database file. The file itself is
    /// created lazily by [`Self::ensure_schema_sync`] or the first write.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self { path: path.to_path_buf() }
    }

    /// Path of the underlying database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Connection, StorageError> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "busy_timeout", 5000i32)?;
        Ok(conn)
    }

    fn table_exists(conn: &Connection) -> Result<bool, StorageError> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'measurements'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Idempotent schema creation.
    ///
    /// A missing file and a present file without the table are distinct
    /// conditions (the latter means earlier data was lost or the file was
    /// swapped); both are repaired the same way.
    pub fn ensure_schema_sync(&self) -> Result<(), StorageError> {
        let file_existed = self.path.exists();
        let conn = self.open()?;
        if !file_existed {
            tracing::info!(path = %self.path.display(), "creating new database file");
        } else if !Self::table_exists(&conn)? {
            tracing::warn!(
                path = %self.path.display(),
                "database file present but measurements table missing, repairing schema"
            );
        }
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(())
    }

    pub fn insert_sync(
        &self,
        value: f64,
        note: &str,
        created_at: Option<NaiveDateTime>,
    ) -> Result<i64, StorageError> {
        if !value.is_finite() {
            return Err(StorageError::Validation(format!("value is not numeric: {value}")));
        }
        let created_at = created_at.unwrap_or_else(now);
        let conn = self.open()?;
        conn.execute(
            "INSERT INTO measurements (value, note, created_at) VALUES (?1, ?2, ?3)",
            params![value, note, created_at.format(TIMESTAMP_FORMAT).to_string()],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn list_all_sync(&self) -> Result<Vec<Measurement>, StorageError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT id, value, COALESCE(note, ''), created_at
             FROM measurements ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Measurement {
                    id: row.get(0)?,
                    value: row.get(1)?,
                    note: row.get(2)?,
                    created_at: read_created_at(&row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_sync(&self) -> Result<u64, StorageError> {
        let conn = self.open()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM measurements", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn clear_sync(&self) -> Result<u64, StorageError> {
        let conn = self.open()?;
        let deleted = conn.execute("DELETE FROM measurements", [])?;
        Ok(deleted as u64)
    }

    pub fn export_all_sync(&self) -> Result<Vec<MeasurementRecord>, StorageError> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT value, COALESCE(note, ''), created_at
             FROM measurements ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MeasurementRecord {
                    value: row.get(0)?,
                    note: row.get(1)?,
                    created_at: read_created_at(&row.get::<_, String>(2)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Clear plus bulk insert as one transaction; a failed restore leaves
    /// the previous contents untouched.
    pub fn restore_replace_sync(
        &self,
        records: &[MeasurementRecord],
    ) -> Result<usize, StorageError> {
        let mut conn = self.open()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM measurements", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO measurements (value, note, created_at) VALUES (?1, ?2, ?3)",
            )?;
            for rec in records {
                stmt.execute(params![
                    rec.value,
                    rec.note,
                    rec.created_at.format(TIMESTAMP_FORMAT).to_string(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(records.len())
    }

    /// Consistent snapshot of the database file.
    ///
    /// `VACUUM INTO` rather than reading the live file: under WAL the latest
    /// writes may still live in the `-wal` sidecar.
    pub fn snapshot_sync(&self) -> Result<Vec<u8>, StorageError> {
        let tmp = self.path.with_extension("snapshot.tmp");
        if tmp.exists() {
            std::fs::remove_file(&tmp)?;
        }
        let conn = self.open()?;
        conn.execute("VACUUM INTO ?1", params![tmp.to_string_lossy()])?;
        let bytes = std::fs::read(&tmp)?;
        std::fs::remove_file(&tmp)?;
        Ok(bytes)
    }

    /// Replaces the database file wholesale with an uploaded snapshot.
    ///
    /// Per-operation connections mean no handle is held on the old file;
    /// stale WAL sidecars are removed so SQLite does not replay them over
    /// the new image.
    pub fn replace_snapshot_sync(&self, bytes: &[u8]) -> Result<(), StorageError> {
        let tmp = self.path.with_extension("upload.tmp");
        std::fs::write(&tmp, bytes)?;
        for suffix in ["-wal", "-shm"] {
            let sidecar = PathBuf::from(format!("{}{suffix}", self.path.display()));
            if sidecar.exists() {
                std::fs::remove_file(&sidecar)?;
            }
        }
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(path = %self.path.display(), "database file replaced from snapshot");
        self.ensure_schema_sync()
    }
}

/// Runs a synchronous SQLite operation on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, StorageError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, StorageError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StorageError::Task(e.to_string()))?
}
