use std::sync::Arc;

use vitalog_core::{parse_timestamp, Measurement, MeasurementRecord};
use vitalog_storage::{MeasurementStore, StorageBackend};

use crate::ServiceError;

/// CRUD over the measurement store with boundary validation.
pub struct MeasurementService {
    storage: Arc<StorageBackend>,
}

/// The canonical seed rows: three measurements with a pressure annotation,
/// used by the admin reset and as fixture data.
fn seed_records() -> Vec<MeasurementRecord> {
    [
        (6.4, "2024-11-29 10:00:00"),
        (6.9, "2024-11-30 10:00:00"),
        (6.8, "2024-12-01 10:00:00"),
    ]
    .into_iter()
    .map(|(value, ts)| MeasurementRecord {
        value,
        note: "Pressure: 130-140".to_owned(),
        created_at: parse_timestamp(ts).expect("seed timestamps are valid"),
    })
    .collect()
}

impl MeasurementService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    /// Records one measurement; returns the assigned id.
    pub async fn add(&self, value: f64, note: Option<String>) -> Result<i64, ServiceError> {
        if !value.is_finite() {
            return Err(ServiceError::InvalidInput(format!(
                "value must be a number, got {value}"
            )));
        }
        Ok(self.storage.insert(value, &note.unwrap_or_default(), None).await?)
    }

    /// All measurements, newest first.
    pub async fn list(&self) -> Result<Vec<Measurement>, ServiceError> {
        Ok(self.storage.list_all().await?)
    }

    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(self.storage.count().await?)
    }

    /// Replaces all data with the canonical test rows. Returns the row
    /// count written.
    pub async fn seed_test_data(&self) -> Result<usize, ServiceError> {
        let written = self.storage.restore_replace(seed_records()).await?;
        tracing::info!(rows = written, "store reset to seed data");
        Ok(written)
    }
}
