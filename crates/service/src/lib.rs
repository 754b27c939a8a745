//! Service layer for vitalog
//!
//! Centralizes business logic between the HTTP handlers and the storage and
//! channel crates.

mod backup_service;
mod error;
mod measurement_service;
mod report_service;

pub use backup_service::{
    BackupService, ExportOutcome, ImportOutcome, RestoreOutcome,
};
pub use error::ServiceError;
pub use measurement_service::MeasurementService;
pub use report_service::ReportService;
