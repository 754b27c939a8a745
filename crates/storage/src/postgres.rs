//! PostgreSQL backend over an sqlx pool.

use chrono::NaiveDateTime;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::Row;
use vitalog_core::{now, Measurement, MeasurementRecord};

use crate::error::StorageError;

/// PostgreSQL-backed measurement store.
#[derive(Debug, Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Connects to the database. Fails fast so the resolver can fall back.
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(std::time::Duration::from_secs(5))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub async fn ensure_schema(&self) -> Result<(), StorageError> {
        let present: bool =
            sqlx::query_scalar("SELECT to_regclass('measurements') IS NOT NULL")
                .fetch_one(&self.pool)
                .await?;
        if !present {
            tracing::warn!("measurements table missing in postgres, creating schema");
        }
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS measurements (
                id BIGSERIAL PRIMARY KEY,
                value DOUBLE PRECISION NOT NULL,
                note TEXT,
                created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
            )",
        )
        .execute(&self.pool)
        .await?;
        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_measurements_created ON measurements(created_at)",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn insert(
        &self,
        value: f64,
        note: &str,
        created_at: Option<NaiveDateTime>,
    ) -> Result<i64, StorageError> {
        if !value.is_finite() {
            return Err(StorageError::Validation(format!("value is not numeric: {value}")));
        }
        let created_at = created_at.unwrap_or_else(now);
        let id: i64 = sqlx::query_scalar(
            "INSERT INTO measurements (value, note, created_at)
             VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(value)
        .bind(note)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    pub async fn list_all(&self) -> Result<Vec<Measurement>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, value, COALESCE(note, '') AS note, created_at
             FROM measurements ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(Measurement {
                    id: row.try_get("id")?,
                    value: row.try_get("value")?,
                    note: row.try_get("note")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    pub async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM measurements")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    pub async fn clear(&self) -> Result<u64, StorageError> {
        let result = sqlx::query("DELETE FROM measurements").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    pub async fn export_all(&self) -> Result<Vec<MeasurementRecord>, StorageError> {
        let rows = sqlx::query(
            "SELECT value, COALESCE(note, '') AS note, created_at
             FROM measurements ORDER BY created_at ASC, id ASC",
        )
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(|row| {
                Ok(MeasurementRecord {
                    value: row.try_get("value")?,
                    note: row.try_get("note")?,
                    created_at: row.try_get("created_at")?,
                })
            })
            .collect()
    }

    /// Clear plus bulk insert in one transaction.
    pub async fn restore_replace(
        &self,
        records: &[MeasurementRecord],
    ) -> Result<usize, StorageError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM measurements").execute(&mut *tx).await?;
        for rec in records {
            sqlx::query(
                "INSERT INTO measurements (value, note, created_at) VALUES ($1, $2, $3)",
            )
            .bind(rec.value)
            .bind(&rec.note)
            .bind(rec.created_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(records.len())
    }
}
