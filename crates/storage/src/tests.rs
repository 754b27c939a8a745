mod error_classification {
    use crate::error::StorageError;

    #[test]
    fn test_transient_errors_are_backend_failures_not_input() {
        let io = StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "connection refused",
        ));
        assert!(io.is_transient());
        assert!(!io.is_validation());

        let pool = StorageError::Postgres(sqlx::Error::PoolTimedOut);
        assert!(pool.is_transient());

        let validation = StorageError::Validation("value is not numeric".to_owned());
        assert!(!validation.is_transient());
        assert!(validation.is_validation());

        let task = StorageError::Task("cancelled".to_owned());
        assert!(!task.is_transient());
    }
}

mod sqlite_store {
    use tempfile::TempDir;
    use vitalog_core::{parse_timestamp, MeasurementRecord};

    use crate::backend::MeasurementStore;
    use crate::sqlite::SqliteStore;

    fn create_test_store() -> (SqliteStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::new(&temp_dir.path().join("test.db"));
        store.ensure_schema_sync().unwrap();
        (store, temp_dir)
    }

    fn record(value: f64, note: &str, ts: &str) -> MeasurementRecord {
        MeasurementRecord {
            value,
            note: note.to_owned(),
            created_at: parse_timestamp(ts).unwrap(),
        }
    }

    #[test]
    fn test_insert_then_list_shows_exact_row() {
        let (store, _tmp) = create_test_store();

        let id = store.insert_sync(6.4, "Pressure: 130-140", None).unwrap();
        assert!(id > 0);

        let rows = store.list_all_sync().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id, id);
        assert_eq!(rows[0].value, 6.4);
        assert_eq!(rows[0].note, "Pressure: 130-140");
    }

    #[test]
    fn test_insert_empty_note() {
        let (store, _tmp) = create_test_store();
        store.insert_sync(5.5, "", None).unwrap();
        assert_eq!(store.list_all_sync().unwrap()[0].note, "");
    }

    #[test]
    fn test_insert_rejects_non_finite_value() {
        let (store, _tmp) = create_test_store();
        let err = store.insert_sync(f64::NAN, "", None).unwrap_err();
        assert!(err.is_validation());
        assert!(store.insert_sync(f64::INFINITY, "", None).is_err());
        assert_eq!(store.count_sync().unwrap(), 0);
    }

    #[test]
    fn test_ids_are_monotonic_and_not_reused() {
        let (store, _tmp) = create_test_store();
        let a = store.insert_sync(1.0, "", None).unwrap();
        let b = store.insert_sync(2.0, "", None).unwrap();
        assert!(b > a);

        store.clear_sync().unwrap();
        let c = store.insert_sync(3.0, "", None).unwrap();
        assert!(c > b, "AUTOINCREMENT must not reuse cleared ids");
    }

    #[test]
    fn test_list_is_descending_by_created_at() {
        let (store, _tmp) = create_test_store();
        store.insert_sync(1.0, "", parse_timestamp("2024-11-29 10:00:00")).unwrap();
        store.insert_sync(3.0, "", parse_timestamp("2024-12-01 10:00:00")).unwrap();
        store.insert_sync(2.0, "", parse_timestamp("2024-11-30 10:00:00")).unwrap();

        let values: Vec<f64> = store.list_all_sync().unwrap().iter().map(|m| m.value).collect();
        assert_eq!(values, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn test_count_and_clear() {
        let (store, _tmp) = create_test_store();
        store.insert_sync(1.0, "", None).unwrap();
        store.insert_sync(2.0, "", None).unwrap();
        assert_eq!(store.count_sync().unwrap(), 2);
        assert_eq!(store.clear_sync().unwrap(), 2);
        assert_eq!(store.count_sync().unwrap(), 0);
    }

    #[test]
    fn test_ensure_schema_idempotent() {
        let (store, _tmp) = create_test_store();
        store.insert_sync(1.0, "", None).unwrap();
        store.ensure_schema_sync().unwrap();
        store.ensure_schema_sync().unwrap();
        assert_eq!(store.count_sync().unwrap(), 1);
    }

    #[test]
    fn test_repairs_file_without_table() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("stray.db");
        // a database file that exists but carries no measurements table
        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch("CREATE TABLE other (x INTEGER)")
            .unwrap();

        let store = SqliteStore::new(&path);
        store.ensure_schema_sync().unwrap();
        store.insert_sync(4.2, "", None).unwrap();
        assert_eq!(store.count_sync().unwrap(), 1);
    }

    #[test]
    fn test_export_restore_round_trip() {
        let (store, _tmp) = create_test_store();
        store.insert_sync(6.4, "Pressure: 130-140", parse_timestamp("2024-11-29 10:00:00")).unwrap();
        store.insert_sync(6.9, "", parse_timestamp("2024-11-30 10:00:00")).unwrap();
        store.insert_sync(6.8, "after lunch", parse_timestamp("2024-12-01 10:00:00")).unwrap();

        let mut exported = store.export_all_sync().unwrap();
        store.clear_sync().unwrap();
        assert_eq!(store.count_sync().unwrap(), 0);

        store.restore_replace_sync(&exported).unwrap();
        let mut restored = store.export_all_sync().unwrap();

        let key = |r: &MeasurementRecord| (r.created_at, r.note.clone());
        exported.sort_by_key(key);
        restored.sort_by_key(key);
        assert_eq!(restored, exported);
    }

    #[test]
    fn test_restore_replace_discards_previous_rows() {
        let (store, _tmp) = create_test_store();
        store.insert_sync(1.0, "old", None).unwrap();

        store
            .restore_replace_sync(&[
                record(6.4, "a", "2024-11-29 10:00:00"),
                record(6.9, "b", "2024-11-30 10:00:00"),
            ])
            .unwrap();

        let rows = store.list_all_sync().unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.note != "old"));
        assert_eq!(
            rows[0].created_at,
            parse_timestamp("2024-11-30 10:00:00").unwrap(),
            "restored rows keep their artifact timestamps"
        );
    }

    #[test]
    fn test_snapshot_is_a_usable_database() {
        let (store, tmp) = create_test_store();
        store.insert_sync(6.4, "note", None).unwrap();

        let bytes = store.snapshot_sync().unwrap();
        assert!(bytes.starts_with(b"SQLite format 3\0"));

        // the snapshot opens as a database with the same contents
        let copy_path = tmp.path().join("copy.db");
        std::fs::write(&copy_path, &bytes).unwrap();
        let copy = SqliteStore::new(&copy_path);
        assert_eq!(copy.count_sync().unwrap(), 1);
    }

    #[test]
    fn test_replace_snapshot_swaps_contents() {
        let (source, _tmp_a) = create_test_store();
        source.insert_sync(6.4, "from snapshot", None).unwrap();
        let bytes = source.snapshot_sync().unwrap();

        let (target, _tmp_b) = create_test_store();
        target.insert_sync(9.9, "to be replaced", None).unwrap();

        target.replace_snapshot_sync(&bytes).unwrap();
        let rows = target.list_all_sync().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].note, "from snapshot");
    }
}

mod backend_dispatch {
    use tempfile::TempDir;

    use crate::backend::{MeasurementStore, StorageBackend};
    use crate::sqlite::SqliteStore;

    async fn create_test_backend() -> (StorageBackend, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let backend =
            StorageBackend::Sqlite(SqliteStore::new(&temp_dir.path().join("test.db")));
        backend.ensure_schema().await.unwrap();
        (backend, temp_dir)
    }

    #[tokio::test]
    async fn test_dispatch_insert_and_count() {
        let (backend, _tmp) = create_test_backend().await;
        backend.insert(6.4, "note", None).await.unwrap();
        assert_eq!(backend.count().await.unwrap(), 1);
        assert_eq!(backend.list_all().await.unwrap()[0].note, "note");
    }

    #[tokio::test]
    async fn test_sqlite_backend_has_snapshot() {
        let (backend, _tmp) = create_test_backend().await;
        backend.insert(6.4, "", None).await.unwrap();
        assert!(backend.snapshot().await.unwrap().is_some());
    }
}
