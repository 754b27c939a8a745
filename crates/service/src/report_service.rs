use std::sync::Arc;

use vitalog_core::{build_report, now, Report};
use vitalog_storage::{MeasurementStore, StorageBackend};

use crate::ServiceError;

/// Report generation over the measurement store.
pub struct ReportService {
    storage: Arc<StorageBackend>,
}

impl ReportService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>) -> Self {
        Self { storage }
    }

    /// Builds the full report from current store contents.
    pub async fn generate(&self) -> Result<Report, ServiceError> {
        let rows = self.storage.list_all().await?;
        Ok(build_report(&rows, now()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitalog_core::parse_timestamp;
    use vitalog_storage::SqliteStore;

    async fn create_test_service() -> (ReportService, Arc<StorageBackend>, TempDir) {
        let tmp = TempDir::new().unwrap();
        let backend =
            Arc::new(StorageBackend::Sqlite(SqliteStore::new(&tmp.path().join("test.db"))));
        backend.ensure_schema().await.unwrap();
        (ReportService::new(Arc::clone(&backend)), backend, tmp)
    }

    #[tokio::test]
    async fn test_report_over_seeded_store() {
        let (svc, storage, _tmp) = create_test_service().await;
        for (value, ts) in
            [(6.4, "2024-11-29 10:00:00"), (6.9, "2024-11-30 10:00:00"), (6.8, "2024-12-01 10:00:00")]
        {
            storage
                .insert(value, "Pressure: 130-140", parse_timestamp(ts))
                .await
                .unwrap();
        }

        let report = svc.generate().await.unwrap();
        assert_eq!(report.stats.total, 3);
        assert_eq!(report.stats.avg, 6.7);
        assert_eq!(report.start_date, "2024-11-29");
        assert_eq!(report.end_date, "2024-12-01");
        assert_eq!(report.table.len(), 3);
        assert_eq!(report.table[0].pressure, "130-140");
        assert!(report.pressure.is_some());
    }

    #[tokio::test]
    async fn test_empty_store_yields_empty_state_report() {
        let (svc, _storage, _tmp) = create_test_service().await;
        let report = svc.generate().await.unwrap();
        assert_eq!(report.stats.total, 0);
        assert!(report.chart.is_empty());
        assert!(report.pressure.is_none());
    }
}
