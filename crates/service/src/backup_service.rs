//! Backup and recovery orchestration.
//!
//! Startup restore from the external channel, manual import/export, and the
//! daily export scheduler. Channel failures never make the store unusable:
//! manual operations surface them to the caller, the scheduler logs and
//! keeps running.

use std::sync::Arc;

use chrono::{Local, Timelike};
use serde::Serialize;
use tokio::sync::watch;
use vitalog_channel::ChannelClient;
use vitalog_core::{summarize, MeasurementRecord};
use vitalog_storage::{MeasurementStore, StorageBackend};

use crate::ServiceError;

/// How many recent channel messages are scanned for a backup artifact.
const RECOVERY_SCAN_LIMIT: usize = 50;

/// File names used for pushed artifacts.
const SNAPSHOT_ARTIFACT: &str = "vitalog.db";
const STRUCTURED_ARTIFACT: &str = "vitalog-backup.json";

/// Result of a (startup or manual) restore attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum RestoreOutcome {
    /// Store already held data; nothing was touched.
    Skipped { existing: u64 },
    /// Restored this many rows from the newest structured artifact.
    Restored { rows: usize },
    /// No structured artifact found on the channel.
    NoArtifact,
    /// Channel not configured or unreachable; store left as-is.
    Unavailable,
}

/// Result of a completed export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportOutcome {
    pub records: usize,
    /// Artifacts actually pushed (summary message, snapshot, structured).
    pub artifacts: usize,
}

/// Result of a manual artifact import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum ImportOutcome {
    /// Structured artifact merged by clear-then-insert.
    Structured { rows: usize },
    /// Raw database file replaced wholesale.
    Snapshot,
}

/// Orchestrates recovery and replication against the record store.
pub struct BackupService {
    storage: Arc<StorageBackend>,
    channel: Option<Arc<ChannelClient>>,
}

impl BackupService {
    #[must_use]
    pub fn new(storage: Arc<StorageBackend>, channel: Option<Arc<ChannelClient>>) -> Self {
        Self { storage, channel }
    }

    /// Whether a backup channel is configured.
    #[must_use]
    pub fn has_channel(&self) -> bool {
        self.channel.is_some()
    }

    /// Restores the store from the newest structured artifact on the
    /// channel, unless the store already holds data.
    ///
    /// Must run before the service accepts external writes. A missing or
    /// unreachable channel is a normal outcome, not an error; only storage
    /// failures propagate.
    pub async fn run_startup_restore(&self) -> Result<RestoreOutcome, ServiceError> {
        let existing = self.storage.count().await?;
        if existing > 0 {
            tracing::info!(existing, "store already populated, skipping restore");
            return Ok(RestoreOutcome::Skipped { existing });
        }

        let Some(channel) = self.channel.as_deref() else {
            tracing::info!("no backup channel configured, starting with empty store");
            return Ok(RestoreOutcome::Unavailable);
        };

        let docs = match channel.recent_documents(RECOVERY_SCAN_LIMIT).await {
            Ok(docs) => docs,
            Err(e) => {
                tracing::warn!(error = %e, "backup channel unreachable during restore");
                return Ok(RestoreOutcome::Unavailable);
            }
        };

        let Some(artifact) = docs.into_iter().find(|d| d.file_name.ends_with(".json"))
        else {
            tracing::info!("no structured artifact found on backup channel");
            return Ok(RestoreOutcome::NoArtifact);
        };

        let bytes = match channel.fetch_document(&artifact.file_id).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, file = artifact.file_name, "artifact fetch failed");
                return Ok(RestoreOutcome::Unavailable);
            }
        };

        let records: Vec<MeasurementRecord> = match serde_json::from_slice(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = %e, file = artifact.file_name, "artifact is not a valid record sequence");
                return Ok(RestoreOutcome::Unavailable);
            }
        };

        let rows = self.storage.restore_replace(records).await?;
        tracing::info!(rows, file = artifact.file_name, "store restored from backup channel");
        Ok(RestoreOutcome::Restored { rows })
    }

    /// Pushes a consistent snapshot of the store to the channel: a summary
    /// message, the raw database file (when the backend has one and rows
    /// exist), and the structured record sequence (when rows exist).
    ///
    /// Artifacts are sent in order with no rollback; the first failure
    /// surfaces after earlier artifacts were already delivered.
    pub async fn export_snapshot(&self) -> Result<ExportOutcome, ServiceError> {
        let channel = self
            .channel
            .as_deref()
            .ok_or_else(|| ServiceError::NotConfigured("backup channel".to_owned()))?;

        let records = self.storage.export_all().await?;
        let values: Vec<f64> = records.iter().map(|r| r.value).collect();
        let stats = summarize(&values);

        let summary = format!(
            "Vitalog backup — {}\nrecords: {}\navg: {} min: {} max: {}",
            Local::now().format("%Y-%m-%d %H:%M"),
            stats.total,
            stats.avg,
            stats.min,
            stats.max,
        );
        channel.send_message(&summary).await?;
        let mut artifacts = 1usize;

        if !records.is_empty() {
            if let Some(snapshot) = self.storage.snapshot().await? {
                channel.send_document(SNAPSHOT_ARTIFACT, snapshot).await?;
                artifacts += 1;
            }
            let json = serde_json::to_vec_pretty(&records)?;
            channel.send_document(STRUCTURED_ARTIFACT, json).await?;
            artifacts += 1;
        }

        tracing::info!(records = records.len(), artifacts, "backup export completed");
        Ok(ExportOutcome { records: records.len(), artifacts })
    }

    /// Applies an uploaded artifact, distinguished by file extension only:
    /// a structured record sequence or a raw database snapshot. Anything
    /// else is a client error.
    pub async fn import_artifact(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<ImportOutcome, ServiceError> {
        let extension = file_name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase());
        match extension.as_deref() {
            Some("json") => {
                let records: Vec<MeasurementRecord> = serde_json::from_slice(&bytes)
                    .map_err(|e| {
                        ServiceError::InvalidInput(format!("invalid record sequence: {e}"))
                    })?;
                let rows = self.storage.restore_replace(records).await?;
                tracing::info!(rows, file_name, "structured artifact imported");
                Ok(ImportOutcome::Structured { rows })
            }
            Some("db" | "sqlite" | "sqlite3") => {
                self.storage.replace_snapshot(bytes).await?;
                tracing::info!(file_name, "snapshot artifact imported");
                Ok(ImportOutcome::Snapshot)
            }
            _ => Err(ServiceError::InvalidInput(format!(
                "unsupported artifact type: {file_name}"
            ))),
        }
    }

    /// Spawns the daily export loop.
    ///
    /// Wakes every minute; when the local wall clock matches
    /// `hour:minute`, runs one export and then sleeps past the minute
    /// window so it cannot re-trigger. Export failures are logged and
    /// swallowed; only the shutdown signal ends the loop.
    pub fn spawn_scheduler(
        self: &Arc<Self>,
        hour: u32,
        minute: u32,
        shutdown: watch::Receiver<bool>,
    ) -> tokio::task::JoinHandle<()> {
        self.spawn_scheduler_with(
            hour,
            minute,
            shutdown,
            || {
                let now = Local::now();
                (now.hour(), now.minute())
            },
            std::time::Duration::from_secs(60),
            std::time::Duration::from_secs(61),
        )
    }

    /// Scheduler loop with the clock and delays injected, so tests can
    /// drive a matching minute through it without waiting wall-clock time.
    fn spawn_scheduler_with<F>(
        self: &Arc<Self>,
        hour: u32,
        minute: u32,
        mut shutdown: watch::Receiver<bool>,
        now_fn: F,
        tick: std::time::Duration,
        guard: std::time::Duration,
    ) -> tokio::task::JoinHandle<()>
    where
        F: Fn() -> (u32, u32) + Send + 'static,
    {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            tracing::info!(hour, minute, "backup scheduler started");
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let (now_hour, now_minute) = now_fn();
                        if now_hour != hour || now_minute != minute {
                            continue;
                        }
                        match service.export_snapshot().await {
                            Ok(outcome) => {
                                tracing::info!(
                                    records = outcome.records,
                                    artifacts = outcome.artifacts,
                                    "scheduled backup export done"
                                );
                            }
                            Err(e) => {
                                tracing::warn!(error = %e, "scheduled backup export failed");
                            }
                        }
                        // sit out the rest of the minute window
                        tokio::select! {
                            _ = tokio::time::sleep(guard) => {}
                            _ = shutdown.changed() => break,
                        }
                    }
                    _ = shutdown.changed() => break,
                }
            }
            tracing::debug!("backup scheduler stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vitalog_core::parse_timestamp;
    use vitalog_storage::SqliteStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn create_test_storage() -> (Arc<StorageBackend>, TempDir) {
        let tmp = TempDir::new().unwrap();
        let backend =
            Arc::new(StorageBackend::Sqlite(SqliteStore::new(&tmp.path().join("test.db"))));
        backend.ensure_schema().await.unwrap();
        (backend, tmp)
    }

    fn channel_for(server: &MockServer) -> Option<Arc<ChannelClient>> {
        Some(Arc::new(
            ChannelClient::new("TOKEN".to_owned(), "42".to_owned())
                .unwrap()
                .with_base_url(server.uri()),
        ))
    }

    fn record_json() -> serde_json::Value {
        serde_json::json!([
            {"value": 6.4, "note": "Pressure: 130-140", "created_at": "2024-11-29 10:00:00"},
            {"value": 6.9, "note": "", "created_at": "2024-11-30 10:00:00"}
        ])
    }

    #[tokio::test]
    async fn test_startup_restore_skips_populated_store() {
        let (storage, _tmp) = create_test_storage().await;
        storage.insert(6.4, "existing", None).await.unwrap();

        // no channel is needed: the guard fires before any channel call
        let svc = BackupService::new(Arc::clone(&storage), None);
        let outcome = svc.run_startup_restore().await.unwrap();
        assert_eq!(outcome, RestoreOutcome::Skipped { existing: 1 });

        let rows = storage.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].note, "existing");
    }

    #[tokio::test]
    async fn test_startup_restore_without_channel_is_unavailable() {
        let (storage, _tmp) = create_test_storage().await;
        let svc = BackupService::new(storage, None);
        assert_eq!(svc.run_startup_restore().await.unwrap(), RestoreOutcome::Unavailable);
    }

    #[tokio::test]
    async fn test_startup_restore_fetches_newest_artifact() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {"update_id": 1, "message": {"date": 100, "document":
                        {"file_id": "old", "file_name": "vitalog-backup.json"}}},
                    {"update_id": 2, "message": {"date": 200, "document":
                        {"file_id": "raw", "file_name": "vitalog.db"}}},
                    {"update_id": 3, "message": {"date": 300, "document":
                        {"file_id": "new", "file_name": "vitalog-backup.json"}}}
                ]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getFile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": {"file_id": "new", "file_path": "documents/latest.json"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/file/botTOKEN/documents/latest.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record_json()))
            .mount(&server)
            .await;

        let svc = BackupService::new(Arc::clone(&storage), channel_for(&server));
        let outcome = svc.run_startup_restore().await.unwrap();
        assert_eq!(outcome, RestoreOutcome::Restored { rows: 2 });

        let rows = storage.list_all().await.unwrap();
        assert_eq!(rows.len(), 2);
        // artifact timestamps preserved
        assert_eq!(rows[1].created_at, parse_timestamp("2024-11-29 10:00:00").unwrap());
    }

    #[tokio::test]
    async fn test_startup_restore_skips_non_structured_attachments() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": [
                    {"update_id": 1, "message": {"date": 100, "document":
                        {"file_id": "raw", "file_name": "vitalog.db"}}}
                ]
            })))
            .mount(&server)
            .await;

        let svc = BackupService::new(storage, channel_for(&server));
        assert_eq!(svc.run_startup_restore().await.unwrap(), RestoreOutcome::NoArtifact);
    }

    #[tokio::test]
    async fn test_startup_restore_survives_unreachable_channel() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/botTOKEN/getUpdates"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let svc = BackupService::new(Arc::clone(&storage), channel_for(&server));
        assert_eq!(svc.run_startup_restore().await.unwrap(), RestoreOutcome::Unavailable);
        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_export_pushes_three_artifacts() {
        let (storage, _tmp) = create_test_storage().await;
        storage.insert(6.4, "", None).await.unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": true, "result": {"message_id": 1}}),
            ))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendDocument"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": true, "result": {"message_id": 2}}),
            ))
            .expect(2)
            .mount(&server)
            .await;

        let svc = BackupService::new(storage, channel_for(&server));
        let outcome = svc.export_snapshot().await.unwrap();
        assert_eq!(outcome.records, 1);
        assert_eq!(outcome.artifacts, 3);
    }

    #[tokio::test]
    async fn test_export_empty_store_sends_summary_only() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": true, "result": {"message_id": 1}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        let svc = BackupService::new(storage, channel_for(&server));
        let outcome = svc.export_snapshot().await.unwrap();
        assert_eq!(outcome.artifacts, 1);
    }

    #[tokio::test]
    async fn test_export_without_channel_fails() {
        let (storage, _tmp) = create_test_storage().await;
        let svc = BackupService::new(storage, None);
        assert!(matches!(
            svc.export_snapshot().await,
            Err(ServiceError::NotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_import_structured_artifact() {
        let (storage, _tmp) = create_test_storage().await;
        storage.insert(9.9, "stale", None).await.unwrap();

        let svc = BackupService::new(Arc::clone(&storage), None);
        let bytes = serde_json::to_vec(&record_json()).unwrap();
        let outcome = svc.import_artifact("backup.json", bytes).await.unwrap();
        assert_eq!(outcome, ImportOutcome::Structured { rows: 2 });
        assert_eq!(storage.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_import_rejects_unknown_extension() {
        let (storage, _tmp) = create_test_storage().await;
        let svc = BackupService::new(storage, None);
        let err = svc.import_artifact("backup.txt", b"hello".to_vec()).await.unwrap_err();
        assert!(err.is_invalid_input());

        let err = svc.import_artifact("no-extension", b"hello".to_vec()).await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test]
    async fn test_import_malformed_json_is_client_error() {
        let (storage, _tmp) = create_test_storage().await;
        let svc = BackupService::new(Arc::clone(&storage), None);
        let err = svc.import_artifact("backup.json", b"{not json".to_vec()).await.unwrap_err();
        assert!(err.is_invalid_input());
        assert_eq!(storage.count().await.unwrap(), 0, "failed import leaves store untouched");
    }

    #[tokio::test]
    async fn test_import_snapshot_replaces_database() {
        let (source, _tmp_a) = create_test_storage().await;
        source.insert(6.4, "from snapshot", None).await.unwrap();
        let snapshot = source.snapshot().await.unwrap().unwrap();

        let (target, _tmp_b) = create_test_storage().await;
        target.insert(1.0, "stale", None).await.unwrap();

        let svc = BackupService::new(Arc::clone(&target), None);
        let outcome = svc.import_artifact("vitalog.db", snapshot).await.unwrap();
        assert_eq!(outcome, ImportOutcome::Snapshot);

        let rows = target.list_all().await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].note, "from snapshot");
    }

    #[tokio::test]
    async fn test_scheduler_fires_on_matching_minute() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": true, "result": {"message_id": 1}}),
            ))
            .expect(1..)
            .mount(&server)
            .await;

        let svc = Arc::new(BackupService::new(storage, channel_for(&server)));
        let (tx, rx) = watch::channel(false);
        let handle = svc.spawn_scheduler_with(
            21,
            0,
            rx,
            || (21, 0),
            std::time::Duration::from_millis(10),
            std::time::Duration::from_secs(60),
        );

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
        // drop verifies the expected sendMessage call
    }

    #[tokio::test]
    async fn test_scheduler_skips_non_matching_minute() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": true, "result": {"message_id": 1}}),
            ))
            .expect(0)
            .mount(&server)
            .await;

        let svc = Arc::new(BackupService::new(storage, channel_for(&server)));
        let (tx, rx) = watch::channel(false);
        let handle = svc.spawn_scheduler_with(
            21,
            0,
            rx,
            || (21, 1),
            std::time::Duration::from_millis(10),
            std::time::Duration::from_secs(60),
        );

        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_guard_prevents_double_fire_within_window() {
        let (storage, _tmp) = create_test_storage().await;
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/botTOKEN/sendMessage"))
            .respond_with(ResponseTemplate::new(200).set_body_json(
                serde_json::json!({"ok": true, "result": {"message_id": 1}}),
            ))
            .expect(1)
            .mount(&server)
            .await;

        // the clock keeps reporting the configured minute; without the
        // post-export guard every tick would fire again
        let svc = Arc::new(BackupService::new(storage, channel_for(&server)));
        let (tx, rx) = watch::channel(false);
        let handle = svc.spawn_scheduler_with(
            21,
            0,
            rx,
            || (21, 0),
            std::time::Duration::from_millis(10),
            std::time::Duration::from_secs(60),
        );

        tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        tx.send(true).unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_scheduler_stops_on_shutdown() {
        let (storage, _tmp) = create_test_storage().await;
        let svc = Arc::new(BackupService::new(storage, None));
        let (tx, rx) = watch::channel(false);

        let handle = svc.spawn_scheduler(3, 0, rx);
        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(2), handle)
            .await
            .expect("scheduler exits promptly on shutdown")
            .unwrap();
    }
}
